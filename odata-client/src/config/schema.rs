//! Declarative schema definitions
//!
//! These are the raw, unlinked descriptions of a service as they appear in a
//! configuration document. The [`RegistryBuilder`](crate::schema::RegistryBuilder)
//! indexes them and `configure` links them into a [`Registry`](crate::schema::Registry).

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// One namespace worth of definitions
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SchemaConfig {
    pub namespace: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alias: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub enums: Vec<EnumConfig>,
    /// Entity and complex types
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub entities: Vec<StructuredTypeConfig>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub callables: Vec<CallableConfig>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub containers: Vec<ContainerConfig>,
}

impl SchemaConfig {
    /// Create an empty schema for a namespace
    pub fn new(namespace: impl Into<String>) -> Self {
        SchemaConfig {
            namespace: namespace.into(),
            ..Default::default()
        }
    }

    /// Set the namespace alias
    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = Some(alias.into());
        self
    }

    /// Add an enum type
    pub fn with_enum(mut self, config: EnumConfig) -> Self {
        self.enums.push(config);
        self
    }

    /// Add an entity or complex type
    pub fn with_entity(mut self, config: StructuredTypeConfig) -> Self {
        self.entities.push(config);
        self
    }

    /// Add an action or function
    pub fn with_callable(mut self, config: CallableConfig) -> Self {
        self.callables.push(config);
        self
    }

    /// Add an entity container
    pub fn with_container(mut self, config: ContainerConfig) -> Self {
        self.containers.push(config);
        self
    }
}

/// Enumeration type definition
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EnumConfig {
    pub name: String,
    /// Member name -> numeric value
    #[serde(default)]
    pub members: BTreeMap<String, i64>,
    /// Bitmask semantics (members may be combined)
    #[serde(default)]
    pub flags: bool,
}

impl EnumConfig {
    pub fn new(name: impl Into<String>) -> Self {
        EnumConfig {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn member(mut self, name: impl Into<String>, value: i64) -> Self {
        self.members.insert(name.into(), value);
        self
    }

    pub fn flags(mut self, flags: bool) -> Self {
        self.flags = flags;
        self
    }
}

/// Entity or complex type definition
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StructuredTypeConfig {
    pub name: String,
    /// Fully qualified name of the base type (single inheritance)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base: Option<String>,
    #[serde(default)]
    pub open: bool,
    #[serde(default)]
    pub fields: Vec<FieldConfig>,
}

impl StructuredTypeConfig {
    pub fn new(name: impl Into<String>) -> Self {
        StructuredTypeConfig {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn base(mut self, base: impl Into<String>) -> Self {
        self.base = Some(base.into());
        self
    }

    pub fn field(mut self, field: FieldConfig) -> Self {
        self.fields.push(field);
        self
    }
}

/// Field definition inside a structured type or a callable's parameter list
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldConfig {
    pub name: String,
    /// Declared type name (e.g. "Edm.String", "Acme.Address")
    #[serde(rename = "type")]
    pub type_name: String,
    #[serde(default)]
    pub collection: bool,
    #[serde(default = "default_nullable")]
    pub nullable: bool,
    #[serde(default)]
    pub key: bool,
    #[serde(default)]
    pub navigation: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_length: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub precision: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scale: Option<u32>,
    /// Wire name of the field when it differs from `name`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    /// Path used to resolve the value from an attribute bag (e.g. "owner/id")
    #[serde(rename = "ref", default, skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,
}

fn default_nullable() -> bool {
    true
}

impl FieldConfig {
    pub fn new(name: impl Into<String>, type_name: impl Into<String>) -> Self {
        FieldConfig {
            name: name.into(),
            type_name: type_name.into(),
            collection: false,
            nullable: true,
            key: false,
            navigation: false,
            default: None,
            max_length: None,
            precision: None,
            scale: None,
            field: None,
            reference: None,
        }
    }

    /// Mark as a key field (keys are never nullable)
    pub fn key(mut self) -> Self {
        self.key = true;
        self.nullable = false;
        self
    }

    pub fn collection(mut self) -> Self {
        self.collection = true;
        self
    }

    pub fn navigation(mut self) -> Self {
        self.navigation = true;
        self
    }

    pub fn required(mut self) -> Self {
        self.nullable = false;
        self
    }

    pub fn default_value(mut self, value: Value) -> Self {
        self.default = Some(value);
        self
    }

    pub fn max_length(mut self, max_length: u32) -> Self {
        self.max_length = Some(max_length);
        self
    }

    pub fn precision(mut self, precision: u32, scale: u32) -> Self {
        self.precision = Some(precision);
        self.scale = Some(scale);
        self
    }

    pub fn reference(mut self, path: impl Into<String>) -> Self {
        self.reference = Some(path.into());
        self
    }
}

/// Action (side effecting) or function (pure)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CallableKind {
    #[default]
    Action,
    Function,
}

/// Action or function definition
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CallableConfig {
    pub name: String,
    #[serde(default)]
    pub kind: CallableKind,
    #[serde(default)]
    pub bound: bool,
    #[serde(default)]
    pub composable: bool,
    /// Explicit URL path; derived from the name when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    /// Entity set the results belong to, when declared
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entity_set_path: Option<String>,
    #[serde(default)]
    pub parameters: Vec<FieldConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub return_type: Option<ReturnTypeConfig>,
}

impl CallableConfig {
    pub fn action(name: impl Into<String>) -> Self {
        CallableConfig {
            name: name.into(),
            kind: CallableKind::Action,
            ..Default::default()
        }
    }

    pub fn function(name: impl Into<String>) -> Self {
        CallableConfig {
            name: name.into(),
            kind: CallableKind::Function,
            ..Default::default()
        }
    }

    pub fn bound(mut self) -> Self {
        self.bound = true;
        self
    }

    pub fn composable(mut self) -> Self {
        self.composable = true;
        self
    }

    pub fn path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    pub fn parameter(mut self, parameter: FieldConfig) -> Self {
        self.parameters.push(parameter);
        self
    }

    pub fn returns(mut self, type_name: impl Into<String>, collection: bool) -> Self {
        self.return_type = Some(ReturnTypeConfig {
            type_name: type_name.into(),
            collection,
            nullable: true,
        });
        self
    }
}

/// Declared return type of a callable
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReturnTypeConfig {
    #[serde(rename = "type")]
    pub type_name: String,
    #[serde(default)]
    pub collection: bool,
    #[serde(default = "default_nullable")]
    pub nullable: bool,
}

/// Entity container with its entity sets and singletons
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContainerConfig {
    pub name: String,
    #[serde(default)]
    pub entity_sets: Vec<EntitySetConfig>,
    #[serde(default)]
    pub singletons: Vec<SingletonConfig>,
}

impl ContainerConfig {
    pub fn new(name: impl Into<String>) -> Self {
        ContainerConfig {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn entity_set(mut self, config: EntitySetConfig) -> Self {
        self.entity_sets.push(config);
        self
    }

    pub fn singleton(mut self, config: SingletonConfig) -> Self {
        self.singletons.push(config);
        self
    }
}

/// Navigation property -> target entity set binding
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NavigationBindingConfig {
    pub path: String,
    pub target: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EntitySetConfig {
    pub name: String,
    /// Fully qualified entity type name
    pub entity_type: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub navigation_bindings: Vec<NavigationBindingConfig>,
}

impl EntitySetConfig {
    pub fn new(name: impl Into<String>, entity_type: impl Into<String>) -> Self {
        EntitySetConfig {
            name: name.into(),
            entity_type: entity_type.into(),
            navigation_bindings: Vec::new(),
        }
    }

    pub fn bind(mut self, path: impl Into<String>, target: impl Into<String>) -> Self {
        self.navigation_bindings.push(NavigationBindingConfig {
            path: path.into(),
            target: target.into(),
        });
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SingletonConfig {
    pub name: String,
    #[serde(rename = "type")]
    pub type_name: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub navigation_bindings: Vec<NavigationBindingConfig>,
}

impl SingletonConfig {
    pub fn new(name: impl Into<String>, type_name: impl Into<String>) -> Self {
        SingletonConfig {
            name: name.into(),
            type_name: type_name.into(),
            navigation_bindings: Vec::new(),
        }
    }
}
