//! SQLite cache snapshot store

use super::{CacheEntry, CacheStorage};
use crate::request::ODataResponse;
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::DateTime;
use sqlx::SqlitePool;

/// Create the snapshot table if missing
pub async fn init_schema(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        "CREATE TABLE IF NOT EXISTS odata_cache (
            url TEXT PRIMARY KEY NOT NULL,
            response TEXT NOT NULL,
            last_read INTEGER NOT NULL
         )",
    )
    .execute(pool)
    .await
    .context("Failed to create cache table")?;

    Ok(())
}

/// Every stored entry, ordered by URL
pub async fn load_entries(pool: &SqlitePool) -> Result<Vec<CacheEntry>> {
    let rows: Vec<(String, String, i64)> =
        sqlx::query_as("SELECT url, response, last_read FROM odata_cache ORDER BY url")
            .fetch_all(pool)
            .await
            .context("Failed to load cache entries")?;

    let mut entries = Vec::with_capacity(rows.len());
    for (url, response, last_read) in rows {
        let response: ODataResponse = serde_json::from_str(&response)
            .with_context(|| format!("Failed to parse cached response for {}", url))?;
        let Some(last_read) = DateTime::from_timestamp_millis(last_read) else {
            log::warn!("Skipping cache entry {} with invalid timestamp {}", url, last_read);
            continue;
        };
        entries.push(CacheEntry {
            url,
            response,
            last_read,
        });
    }

    Ok(entries)
}

/// Replace the stored snapshot with `entries`
pub async fn save_entries(pool: &SqlitePool, entries: &[CacheEntry]) -> Result<()> {
    let mut tx = pool.begin().await.context("Failed to begin transaction")?;

    sqlx::query("DELETE FROM odata_cache")
        .execute(&mut *tx)
        .await
        .context("Failed to clear cache table")?;

    for entry in entries {
        let response = serde_json::to_string(&entry.response)
            .context("Failed to serialize cached response")?;
        sqlx::query("INSERT INTO odata_cache (url, response, last_read) VALUES (?, ?, ?)")
            .bind(&entry.url)
            .bind(response)
            .bind(entry.last_read.timestamp_millis())
            .execute(&mut *tx)
            .await
            .with_context(|| format!("Failed to store cache entry {}", entry.url))?;
    }

    tx.commit().await.context("Failed to commit cache snapshot")?;

    Ok(())
}

/// Remove a single entry
pub async fn delete_entry(pool: &SqlitePool, url: &str) -> Result<()> {
    sqlx::query("DELETE FROM odata_cache WHERE url = ?")
        .bind(url)
        .execute(pool)
        .await
        .context("Failed to delete cache entry")?;

    Ok(())
}

/// Snapshot store backed by an `odata_cache` table
#[derive(Debug, Clone)]
pub struct SqliteStorage {
    pool: SqlitePool,
}

impl SqliteStorage {
    /// Wrap a pool, creating the table when needed
    pub async fn new(pool: SqlitePool) -> Result<Self> {
        init_schema(&pool).await?;
        Ok(Self { pool })
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

#[async_trait]
impl CacheStorage for SqliteStorage {
    async fn load(&self) -> Result<Vec<CacheEntry>> {
        load_entries(&self.pool).await
    }

    async fn save(&self, entries: &[CacheEntry]) -> Result<()> {
        save_entries(&self.pool, entries).await
    }
}
