//! Response cache
//!
//! A TTL-bounded map from full request URL (with query string) to the raw
//! response. Only GET requests are cached. Reads and writes take the current
//! time and the max age explicitly; the client feeds them from its [`Clock`].

pub mod storage;
#[cfg(feature = "sqlite-cache")]
pub mod sqlite;

pub use storage::{CacheStorage, JsonFileStorage};
#[cfg(feature = "sqlite-cache")]
pub use sqlite::SqliteStorage;

use crate::request::{Method, ODataRequest, ODataResponse};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::RwLock;
use std::time::Duration;

/// Source of the current time
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall clock
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A cached response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry {
    pub url: String,
    pub response: ODataResponse,
    #[serde(rename = "lastRead", with = "chrono::serde::ts_milliseconds")]
    pub last_read: DateTime<Utc>,
}

impl CacheEntry {
    pub fn is_expired(&self, now: DateTime<Utc>, max_age: Duration) -> bool {
        self.last_read < now - to_chrono(max_age)
    }
}

fn to_chrono(duration: Duration) -> chrono::Duration {
    chrono::Duration::milliseconds(i64::try_from(duration.as_millis()).unwrap_or(i64::MAX))
}

/// Shared response store
#[derive(Debug, Default)]
pub struct ODataCache {
    entries: RwLock<HashMap<String, CacheEntry>>,
}

impl ODataCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_cacheable(request: &ODataRequest) -> bool {
        request.method == Method::Get
    }

    /// Cached response for `url`, unless it is older than `max_age`
    pub fn get(&self, url: &str, now: DateTime<Utc>, max_age: Duration) -> Option<ODataResponse> {
        let entries = self
            .entries
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        match entries.get(url) {
            Some(entry) if !entry.is_expired(now, max_age) => {
                log::debug!("Cache hit for {}", url);
                Some(entry.response.clone())
            }
            Some(_) => {
                log::debug!("Cache entry for {} is stale", url);
                None
            }
            None => {
                log::debug!("Cache miss for {}", url);
                None
            }
        }
    }

    /// Store a response and purge every expired entry
    pub fn put(&self, url: &str, response: ODataResponse, now: DateTime<Utc>, max_age: Duration) {
        let mut entries = self
            .entries
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        entries.insert(
            url.to_string(),
            CacheEntry {
                url: url.to_string(),
                response,
                last_read: now,
            },
        );
        let evicted = purge(&mut entries, now, max_age);
        if evicted > 0 {
            log::debug!("Evicted {} expired cache entries", evicted);
        }
    }

    /// Drop expired entries, returning how many were removed
    pub fn remove_expired(&self, now: DateTime<Utc>, max_age: Duration) -> usize {
        let mut entries = self
            .entries
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        purge(&mut entries, now, max_age)
    }

    pub fn contains(&self, url: &str) -> bool {
        self.entries
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .contains_key(url)
    }

    pub fn len(&self) -> usize {
        self.entries
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        self.entries
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clear();
    }

    /// Copy of every entry, sorted by URL
    pub fn snapshot(&self) -> Vec<CacheEntry> {
        let entries = self
            .entries
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let mut snapshot: Vec<CacheEntry> = entries.values().cloned().collect();
        snapshot.sort_by(|a, b| a.url.cmp(&b.url));
        snapshot
    }

    /// Merge entries from a snapshot; newer entries win
    pub fn restore(&self, snapshot: Vec<CacheEntry>) {
        let mut entries = self
            .entries
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        for entry in snapshot {
            match entries.get(&entry.url) {
                Some(existing) if existing.last_read >= entry.last_read => {}
                _ => {
                    entries.insert(entry.url.clone(), entry);
                }
            }
        }
    }

    /// Restore the entries persisted in `storage`
    pub async fn load_from(&self, storage: &dyn CacheStorage) -> anyhow::Result<usize> {
        let entries = storage.load().await?;
        let count = entries.len();
        self.restore(entries);
        log::info!("Loaded {} cached responses", count);
        Ok(count)
    }

    /// Persist the current entries to `storage`
    pub async fn flush_to(&self, storage: &dyn CacheStorage) -> anyhow::Result<usize> {
        let entries = self.snapshot();
        storage.save(&entries).await?;
        log::debug!("Flushed {} cached responses", entries.len());
        Ok(entries.len())
    }
}

fn purge(
    entries: &mut HashMap<String, CacheEntry>,
    now: DateTime<Utc>,
    max_age: Duration,
) -> usize {
    let before = entries.len();
    entries.retain(|_, entry| !entry.is_expired(now, max_age));
    before - entries.len()
}
