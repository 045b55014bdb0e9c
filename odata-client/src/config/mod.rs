//! Client configuration
//!
//! An [`ApiConfig`] describes one OData service: where it lives, which
//! protocol options apply and which schemas it exposes. Configurations load
//! from TOML or JSON documents and come with presets for common setups.

pub mod csdl;
pub mod schema;

pub use schema::{
    CallableConfig, CallableKind, ContainerConfig, EntitySetConfig, EnumConfig, FieldConfig,
    NavigationBindingConfig, ReturnTypeConfig, SchemaConfig, SingletonConfig,
    StructuredTypeConfig,
};

use crate::constants::{DEFAULT_CACHE_MAX_AGE_MS, DEFAULT_VERSION};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

/// Configuration of a single OData service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub service_root_url: String,
    #[serde(default = "default_version")]
    pub version: String,
    /// Query parameters added to every request
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub params: BTreeMap<String, String>,
    /// Headers added to every request
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub headers: BTreeMap<String, String>,
    #[serde(default)]
    pub options: ApiOptions,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub schemas: Vec<SchemaConfig>,
}

fn default_version() -> String {
    DEFAULT_VERSION.to_string()
}

/// Payload handling options shared by every parser
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ApiOptions {
    /// Keep enum values as member names instead of numbers
    #[serde(default)]
    pub string_as_enum: bool,
    /// Exchange Int64 and Decimal values as JSON strings
    #[serde(default)]
    pub ieee754_compatible: bool,
    #[serde(default)]
    pub metadata: MetadataLevel,
}

impl ApiOptions {
    /// Value of the `Accept` header for these options
    pub fn accept_header(&self) -> String {
        let mut accept = format!("application/json;odata.metadata={}", self.metadata.as_str());
        if self.ieee754_compatible {
            accept.push_str(";IEEE754Compatible=true");
        }
        accept
    }
}

/// Amount of control information requested from the service
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MetadataLevel {
    #[default]
    Minimal,
    Full,
    None,
}

impl MetadataLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            MetadataLevel::Minimal => "minimal",
            MetadataLevel::Full => "full",
            MetadataLevel::None => "none",
        }
    }
}

/// Response cache settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheConfig {
    #[serde(default = "default_cache_enabled")]
    pub enabled: bool,
    #[serde(default = "default_max_age_ms")]
    pub max_age_ms: u64,
}

fn default_cache_enabled() -> bool {
    true
}

fn default_max_age_ms() -> u64 {
    DEFAULT_CACHE_MAX_AGE_MS
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_age_ms: DEFAULT_CACHE_MAX_AGE_MS,
        }
    }
}

impl CacheConfig {
    pub fn max_age(&self) -> Duration {
        Duration::from_millis(self.max_age_ms)
    }

    /// Cache switched off entirely
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            max_age_ms: 0,
        }
    }
}

impl ApiConfig {
    /// Minimal configuration for a service root with default options
    pub fn new(service_root_url: impl Into<String>) -> Self {
        Self {
            name: None,
            service_root_url: service_root_url.into(),
            version: default_version(),
            params: BTreeMap::new(),
            headers: BTreeMap::new(),
            options: ApiOptions::default(),
            cache: CacheConfig::default(),
            schemas: Vec::new(),
        }
    }

    /// Preset for services that require IEEE754-safe numbers and full metadata
    pub fn strict(service_root_url: impl Into<String>) -> Self {
        let mut config = Self::new(service_root_url);
        config.options.ieee754_compatible = true;
        config.options.metadata = MetadataLevel::Full;
        config
    }

    /// Preset with the response cache disabled
    pub fn uncached(service_root_url: impl Into<String>) -> Self {
        let mut config = Self::new(service_root_url);
        config.cache = CacheConfig::disabled();
        config
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_schema(mut self, schema: SchemaConfig) -> Self {
        self.schemas.push(schema);
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    pub fn with_param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.insert(name.into(), value.into());
        self
    }

    pub fn with_options(mut self, options: ApiOptions) -> Self {
        self.options = options;
        self
    }

    pub fn with_cache(mut self, cache: CacheConfig) -> Self {
        self.cache = cache;
        self
    }

    /// Parse a TOML configuration document
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).context("Failed to parse TOML API configuration")
    }

    /// Parse a JSON configuration document
    pub fn from_json_str(content: &str) -> Result<Self> {
        serde_json::from_str(content).context("Failed to parse JSON API configuration")
    }

    /// Load a configuration file, choosing the format by extension
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;

        let config = match path.extension().and_then(|ext| ext.to_str()) {
            Some("toml") => Self::from_toml_str(&content)?,
            Some("json") => Self::from_json_str(&content)?,
            Some("xml") | Some("edmx") => {
                anyhow::bail!(
                    "{} is a metadata document; use config::csdl::parse_metadata",
                    path.display()
                )
            }
            other => anyhow::bail!("Unsupported config file extension: {:?}", other),
        };

        log::debug!(
            "Loaded API config from {} ({} schemas)",
            path.display(),
            config.schemas.len()
        );
        Ok(config)
    }

    /// Serialize back to TOML
    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string_pretty(self).context("Failed to serialize API configuration")
    }
}
