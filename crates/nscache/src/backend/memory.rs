//! In-memory implementation of [`FlatCache`].
//!
//! Map-backed, partitioned by version, with lazy TTL expiry on the tokio
//! clock (so tests can pause and advance time).

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use tokio::sync::RwLock;
use tokio::time::Instant;
use tracing::debug;

use super::FlatCache;
use crate::error::CacheResult;

/// Longest key accepted by [`MemoryCache::validate_key`] (memcached limit).
pub const MAX_KEY_LENGTH: usize = 250;

type EntryKey = (Option<String>, String);

#[derive(Debug, Clone)]
struct Entry {
    value: Bytes,
    expires_at: Option<Instant>,
}

impl Entry {
    fn is_live(&self, now: Instant) -> bool {
        self.expires_at.map_or(true, |at| at > now)
    }
}

/// Process-local flat cache.
#[derive(Debug, Default)]
pub struct MemoryCache {
    entries: RwLock<HashMap<EntryKey, Entry>>,
}

impl MemoryCache {
    /// Create an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored entries across all versions, expired ones included
    /// until they are purged.
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    /// Whether no entries are stored.
    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }

    /// Drop every expired entry.
    pub async fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let mut entries = self.entries.write().await;
        let before = entries.len();
        entries.retain(|_, entry| entry.is_live(now));
        let purged = before - entries.len();
        if purged > 0 {
            debug!(purged, "purged expired entries");
        }
        purged
    }

    fn entry_key(key: &str, version: Option<&str>) -> EntryKey {
        (version.map(String::from), key.to_string())
    }
}

#[async_trait]
impl FlatCache for MemoryCache {
    async fn get(&self, key: &str, version: Option<&str>) -> CacheResult<Option<Bytes>> {
        let entry_key = Self::entry_key(key, version);
        let now = Instant::now();

        {
            let entries = self.entries.read().await;
            match entries.get(&entry_key) {
                None => return Ok(None),
                Some(entry) if entry.is_live(now) => return Ok(Some(entry.value.clone())),
                Some(_) => {}
            }
        }

        let mut entries = self.entries.write().await;
        if entries.get(&entry_key).is_some_and(|e| !e.is_live(now)) {
            entries.remove(&entry_key);
            debug!(key, ?version, "entry expired");
        }
        Ok(None)
    }

    async fn set(
        &self,
        key: &str,
        value: Bytes,
        ttl: Option<Duration>,
        version: Option<&str>,
    ) -> CacheResult<()> {
        let expires_at = ttl.map(|ttl| Instant::now() + ttl);
        self.entries
            .write()
            .await
            .insert(Self::entry_key(key, version), Entry { value, expires_at });
        Ok(())
    }

    async fn delete(&self, key: &str, version: Option<&str>) -> CacheResult<()> {
        self.entries
            .write()
            .await
            .remove(&Self::entry_key(key, version));
        Ok(())
    }

    async fn has_key(&self, key: &str, version: Option<&str>) -> CacheResult<bool> {
        Ok(self.get(key, version).await?.is_some())
    }

    async fn clear(&self) -> CacheResult<()> {
        self.entries.write().await.clear();
        debug!("cleared memory cache");
        Ok(())
    }

    fn validate_key(&self, key: &str) -> bool {
        if key.len() > MAX_KEY_LENGTH {
            debug!(
                len = key.len(),
                max = MAX_KEY_LENGTH,
                "cache key too long for portable backends"
            );
            return false;
        }
        if key.chars().any(|c| c.is_control() || c == ' ') {
            debug!(key, "cache key contains spaces or control characters");
            return false;
        }
        true
    }
}
