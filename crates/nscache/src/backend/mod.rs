//! Wrapped flat cache abstraction.
//!
//! The namespaced layer only needs exact-key operations from the cache it
//! wraps. Anything that can get, set and delete opaque values by key (a
//! memcached or redis client, a local map) can implement [`FlatCache`].
//!
//! # Versions
//!
//! Every keyed operation takes an optional version tag. Keys stored under
//! different versions are fully isolated; the tag is opaque to this crate.
//!
//! # TTL
//!
//! `None` means the entry never expires, `Some(Duration::ZERO)` means it
//! expires immediately. Expiry is entirely the backend's business.

pub mod memory;

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;

use crate::error::CacheResult;

pub use memory::MemoryCache;

/// The core flat cache trait.
#[async_trait]
pub trait FlatCache: Send + Sync {
    /// Read a value.
    ///
    /// Returns `Ok(None)` on a miss (including expired entries).
    async fn get(&self, key: &str, version: Option<&str>) -> CacheResult<Option<Bytes>>;

    /// Store a value, replacing any previous one.
    async fn set(
        &self,
        key: &str,
        value: Bytes,
        ttl: Option<Duration>,
        version: Option<&str>,
    ) -> CacheResult<()>;

    /// Delete a value. Deleting a missing key succeeds.
    async fn delete(&self, key: &str, version: Option<&str>) -> CacheResult<()>;

    /// Check whether a live value exists.
    async fn has_key(&self, key: &str, version: Option<&str>) -> CacheResult<bool>;

    /// Read several values; misses are left out of the result.
    async fn get_many(
        &self,
        keys: &[&str],
        version: Option<&str>,
    ) -> CacheResult<HashMap<String, Bytes>> {
        let mut found = HashMap::with_capacity(keys.len());
        for key in keys {
            if let Some(value) = self.get(key, version).await? {
                found.insert((*key).to_string(), value);
            }
        }
        Ok(found)
    }

    /// Store several values. Stops at the first failure.
    async fn set_many(
        &self,
        data: HashMap<String, Bytes>,
        ttl: Option<Duration>,
        version: Option<&str>,
    ) -> CacheResult<()> {
        for (key, value) in data {
            self.set(&key, value, ttl, version).await?;
        }
        Ok(())
    }

    /// Remove every entry in every version.
    async fn clear(&self) -> CacheResult<()>;

    /// Whether the backend accepts `key` as-is.
    fn validate_key(&self, key: &str) -> bool;
}
