//! Namespace-aware cache facade.
//!
//! [`NamespacedCache`] exposes the usual cache operations on dotted keys and
//! adds prefix listing ([`get_keys`](NamespacedCache::get_keys)) and cascading
//! delete ([`delete_keys`](NamespacedCache::delete_keys)).
//!
//! # Consistency
//!
//! Writes store the value first and update the index second; deletes remove
//! the value first. A failure in between leaves a value that is not listed,
//! never a listed key whose value was never written. Values that the wrapped cache
//! expires on its own stay listed until they are deleted through this facade.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, warn};

use crate::backend::FlatCache;
use crate::config::NamespaceConfig;
use crate::error::{CacheError, CacheResult};
use crate::index::NamespaceIndex;
use crate::router::KeyRouter;

/// Flat cache wrapper with hierarchical key support.
pub struct NamespacedCache<C> {
    cache: Arc<C>,
    router: KeyRouter,
    index: NamespaceIndex<C>,
}

impl<C: FlatCache> NamespacedCache<C> {
    /// Wrap `cache` with the default configuration.
    pub fn new(cache: C) -> Self {
        Self::build(Arc::new(cache), KeyRouter::default())
    }

    /// Wrap `cache` with a custom configuration.
    pub fn with_config(cache: C, config: &NamespaceConfig) -> CacheResult<Self> {
        Self::from_arc(Arc::new(cache), config)
    }

    /// Wrap a shared cache handle.
    pub fn from_arc(cache: Arc<C>, config: &NamespaceConfig) -> CacheResult<Self> {
        config.validate()?;
        Ok(Self::build(cache, KeyRouter::new(config)))
    }

    fn build(cache: Arc<C>, router: KeyRouter) -> Self {
        let index = NamespaceIndex::new(cache.clone(), router.clone());
        Self {
            cache,
            router,
            index,
        }
    }

    /// The wrapped cache.
    pub fn inner(&self) -> &C {
        &self.cache
    }

    /// The key router in use.
    pub fn router(&self) -> &KeyRouter {
        &self.router
    }

    /// The namespace index.
    pub fn index(&self) -> &NamespaceIndex<C> {
        &self.index
    }

    /// Read a value. Does not consult the index.
    pub async fn get(&self, key: &str, version: Option<&str>) -> CacheResult<Option<Bytes>> {
        self.cache.get(key, version).await
    }

    /// Read a value, falling back to `default` on a miss.
    pub async fn get_or(
        &self,
        key: &str,
        default: Bytes,
        version: Option<&str>,
    ) -> CacheResult<Bytes> {
        Ok(self.cache.get(key, version).await?.unwrap_or(default))
    }

    /// Store a value and record the key in the index.
    pub async fn set(
        &self,
        key: &str,
        value: impl Into<Bytes>,
        ttl: Option<Duration>,
        version: Option<&str>,
    ) -> CacheResult<()> {
        if self.router.is_reserved(key) {
            warn!(key, "key uses a reserved index marker and may clobber the index");
        }
        self.cache.set(key, value.into(), ttl, version).await?;

        let (root, base) = self.router.split(key);
        self.index.record_key(root, base, version).await
    }

    /// Store a value only if the key is not live yet.
    ///
    /// Returns whether the value was stored. The check and the write are two
    /// cache calls, so another writer can slip in between.
    pub async fn add(
        &self,
        key: &str,
        value: impl Into<Bytes>,
        ttl: Option<Duration>,
        version: Option<&str>,
    ) -> CacheResult<bool> {
        if self.cache.has_key(key, version).await? {
            return Ok(false);
        }
        self.set(key, value, ttl, version).await?;
        Ok(true)
    }

    /// Delete exactly one key. Descendants (`key.x`) are left alone.
    pub async fn delete(&self, key: &str, version: Option<&str>) -> CacheResult<()> {
        self.cache.delete(key, version).await?;

        let (root, base) = self.router.split(key);
        self.index.forget_key(root, base, version).await
    }

    /// Check whether a live value exists. Does not consult the index.
    pub async fn has_key(&self, key: &str, version: Option<&str>) -> CacheResult<bool> {
        self.cache.has_key(key, version).await
    }

    /// Read several values; misses are left out.
    pub async fn get_many(
        &self,
        keys: &[&str],
        version: Option<&str>,
    ) -> CacheResult<HashMap<String, Bytes>> {
        self.cache.get_many(keys, version).await
    }

    /// Store several values, one [`set`](Self::set) at a time.
    ///
    /// Stops at the first failure; values already stored stay stored.
    pub async fn set_many(
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

    /// Delete several keys, one [`delete`](Self::delete) at a time.
    ///
    /// Stops at the first failure.
    pub async fn delete_many(&self, keys: &[&str], version: Option<&str>) -> CacheResult<()> {
        for key in keys {
            self.delete(key, version).await?;
        }
        Ok(())
    }

    /// List indexed keys.
    ///
    /// | pattern | matches |
    /// |---------|---------|
    /// | `None` | every indexed key |
    /// | `"c"` | `c`, `c.a`, `c.anything` |
    /// | `"c."` | every key starting with `c.`; never the bare `c` |
    /// | `"c.a"` | `c.a`, `c.ab`, `c.a.x` |
    ///
    /// Matching is a plain string prefix, not a segment prefix: `"c.a"` also
    /// matches `c.ab`. Order is unspecified.
    pub async fn get_keys(
        &self,
        pattern: Option<&str>,
        version: Option<&str>,
    ) -> CacheResult<Vec<String>> {
        let Some(pattern) = pattern else {
            return Ok(self.index.list_all(version).await?.into_iter().collect());
        };

        let (root, _) = self.router.split(pattern);
        let mut keys = self.index.list_under_root(root, version).await?;

        if pattern.ends_with(self.router.divisor()) {
            keys.retain(|key| key != root);
        }
        keys.retain(|key| key.starts_with(pattern));

        debug!(pattern, matched = keys.len(), ?version, "matched keys");
        Ok(keys)
    }

    /// Delete every key [`get_keys`](Self::get_keys) returns for `pattern`.
    ///
    /// Keys are deleted one by one; on failure the remaining keys are left in
    /// place. Returns the number of deleted keys.
    pub async fn delete_keys(
        &self,
        pattern: Option<&str>,
        version: Option<&str>,
    ) -> CacheResult<usize> {
        let keys = self.get_keys(pattern, version).await?;
        for key in &keys {
            self.delete(key, version).await?;
        }
        debug!(?pattern, deleted = keys.len(), ?version, "cascading delete");
        Ok(keys.len())
    }

    /// Whether the wrapped cache accepts `key`.
    pub fn validate_key(&self, key: &str) -> bool {
        self.cache.validate_key(key)
    }

    /// Remove every value and the whole index, in every version.
    pub async fn clear(&self) -> CacheResult<()> {
        self.index.reset().await
    }

    /// Serialize `value` as JSON and [`set`](Self::set) it.
    pub async fn set_json<T: Serialize + ?Sized>(
        &self,
        key: &str,
        value: &T,
        ttl: Option<Duration>,
        version: Option<&str>,
    ) -> CacheResult<()> {
        let bytes = serde_json::to_vec(value).map_err(|e| CacheError::Serialization {
            key: key.to_string(),
            message: e.to_string(),
        })?;
        self.set(key, bytes, ttl, version).await
    }

    /// [`get`](Self::get) a value and deserialize it from JSON.
    pub async fn get_json<T: DeserializeOwned>(
        &self,
        key: &str,
        version: Option<&str>,
    ) -> CacheResult<Option<T>> {
        match self.cache.get(key, version).await? {
            None => Ok(None),
            Some(bytes) => serde_json::from_slice(&bytes)
                .map(Some)
                .map_err(|e| CacheError::Serialization {
                    key: key.to_string(),
                    message: e.to_string(),
                }),
        }
    }

    /// Not supported: counters have no defined interaction with the index.
    pub async fn incr(&self, _key: &str, _delta: i64, _version: Option<&str>) -> CacheResult<i64> {
        Err(CacheError::unsupported("incr"))
    }

    /// Not supported: counters have no defined interaction with the index.
    pub async fn decr(&self, _key: &str, _delta: i64, _version: Option<&str>) -> CacheResult<i64> {
        Err(CacheError::unsupported("decr"))
    }

    /// Not supported: moving a key between versions would orphan its index
    /// entries.
    pub async fn incr_version(
        &self,
        _key: &str,
        _delta: i64,
        _version: Option<&str>,
    ) -> CacheResult<String> {
        Err(CacheError::unsupported("incr_version"))
    }

    /// Not supported, see [`incr_version`](Self::incr_version).
    pub async fn decr_version(
        &self,
        _key: &str,
        _delta: i64,
        _version: Option<&str>,
    ) -> CacheResult<String> {
        Err(CacheError::unsupported("decr_version"))
    }
}

/// A namespaced cache is itself a flat cache, so it can stand in wherever a
/// [`FlatCache`] is expected.
#[async_trait]
impl<C: FlatCache> FlatCache for NamespacedCache<C> {
    async fn get(&self, key: &str, version: Option<&str>) -> CacheResult<Option<Bytes>> {
        NamespacedCache::get(self, key, version).await
    }

    async fn set(
        &self,
        key: &str,
        value: Bytes,
        ttl: Option<Duration>,
        version: Option<&str>,
    ) -> CacheResult<()> {
        NamespacedCache::set(self, key, value, ttl, version).await
    }

    async fn delete(&self, key: &str, version: Option<&str>) -> CacheResult<()> {
        NamespacedCache::delete(self, key, version).await
    }

    async fn has_key(&self, key: &str, version: Option<&str>) -> CacheResult<bool> {
        NamespacedCache::has_key(self, key, version).await
    }

    async fn get_many(
        &self,
        keys: &[&str],
        version: Option<&str>,
    ) -> CacheResult<HashMap<String, Bytes>> {
        NamespacedCache::get_many(self, keys, version).await
    }

    async fn set_many(
        &self,
        data: HashMap<String, Bytes>,
        ttl: Option<Duration>,
        version: Option<&str>,
    ) -> CacheResult<()> {
        NamespacedCache::set_many(self, data, ttl, version).await
    }

    async fn clear(&self) -> CacheResult<()> {
        NamespacedCache::clear(self).await
    }

    fn validate_key(&self, key: &str) -> bool {
        NamespacedCache::validate_key(self, key)
    }
}
