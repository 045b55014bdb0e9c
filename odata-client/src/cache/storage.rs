//! Durable cache snapshots

use super::CacheEntry;
use anyhow::{Context, Result};
use async_trait::async_trait;
use std::path::{Path, PathBuf};

/// Key-value store that can hold a cache snapshot
#[async_trait]
pub trait CacheStorage: Send + Sync {
    async fn load(&self) -> Result<Vec<CacheEntry>>;
    async fn save(&self, entries: &[CacheEntry]) -> Result<()>;
}

/// Snapshot kept as a JSON array in a single file
#[derive(Debug, Clone)]
pub struct JsonFileStorage {
    path: PathBuf,
}

impl JsonFileStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl CacheStorage for JsonFileStorage {
    async fn load(&self) -> Result<Vec<CacheEntry>> {
        if !tokio::fs::try_exists(&self.path).await.unwrap_or(false) {
            log::debug!("No cache snapshot at {}", self.path.display());
            return Ok(Vec::new());
        }
        let content = tokio::fs::read_to_string(&self.path)
            .await
            .with_context(|| format!("Failed to read cache snapshot {}", self.path.display()))?;
        let entries = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse cache snapshot {}", self.path.display()))?;
        Ok(entries)
    }

    async fn save(&self, entries: &[CacheEntry]) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .with_context(|| format!("Failed to create directory {}", parent.display()))?;
        }
        let content =
            serde_json::to_string_pretty(entries).context("Failed to serialize cache snapshot")?;
        tokio::fs::write(&self.path, content)
            .await
            .with_context(|| format!("Failed to write cache snapshot {}", self.path.display()))?;
        Ok(())
    }
}
