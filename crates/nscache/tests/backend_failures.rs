//! Failure propagation tests.
//!
//! A wrapped cache that fails on chosen keys checks write ordering, fail-fast
//! bulk behavior and that backend errors reach the caller unchanged.

use std::collections::{HashMap, HashSet};
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use nscache::{CacheError, CacheResult, FlatCache, MemoryCache, NamespacedCache};

/// MemoryCache that rejects writes or deletes of selected keys.
#[derive(Default)]
struct FlakyCache {
    inner: MemoryCache,
    fail_set: HashSet<String>,
    fail_delete: HashSet<String>,
}

impl FlakyCache {
    fn failing_set(keys: &[&str]) -> Self {
        Self {
            fail_set: keys.iter().map(|k| k.to_string()).collect(),
            ..Default::default()
        }
    }

    fn failing_delete(keys: &[&str]) -> Self {
        Self {
            fail_delete: keys.iter().map(|k| k.to_string()).collect(),
            ..Default::default()
        }
    }
}

#[async_trait]
impl FlatCache for FlakyCache {
    async fn get(&self, key: &str, version: Option<&str>) -> CacheResult<Option<Bytes>> {
        self.inner.get(key, version).await
    }

    async fn set(
        &self,
        key: &str,
        value: Bytes,
        ttl: Option<Duration>,
        version: Option<&str>,
    ) -> CacheResult<()> {
        if self.fail_set.contains(key) {
            return Err(CacheError::Backend {
                message: format!("write refused: {}", key),
            });
        }
        self.inner.set(key, value, ttl, version).await
    }

    async fn delete(&self, key: &str, version: Option<&str>) -> CacheResult<()> {
        if self.fail_delete.contains(key) {
            return Err(anyhow::anyhow!("connection reset while deleting {}", key).into());
        }
        self.inner.delete(key, version).await
    }

    async fn has_key(&self, key: &str, version: Option<&str>) -> CacheResult<bool> {
        self.inner.has_key(key, version).await
    }

    async fn clear(&self) -> CacheResult<()> {
        self.inner.clear().await
    }

    fn validate_key(&self, key: &str) -> bool {
        self.inner.validate_key(key)
    }
}

#[tokio::test]
async fn test_failed_value_write_is_not_indexed() {
    let cache = NamespacedCache::new(FlakyCache::failing_set(&["a.bad"]));

    let err = cache.set("a.bad", "x", None, None).await.unwrap_err();
    match err {
        CacheError::Backend { message } => assert_eq!(message, "write refused: a.bad"),
        other => panic!("unexpected error: {:?}", other),
    }

    assert!(cache.get_keys(None, None).await.unwrap().is_empty());
    assert!(cache.index().roots(None).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_failed_index_write_leaves_orphan_value() {
    let cache = NamespacedCache::new(FlakyCache::failing_set(&["__keys-list__a"]));

    let err = cache.set("a.b", "x", None, None).await.unwrap_err();
    assert!(err.is_retryable());

    // Value landed, index did not
    assert!(cache.has_key("a.b", None).await.unwrap());
    assert!(cache.get_keys(Some("a"), None).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_set_many_fails_fast() {
    let cache = NamespacedCache::new(FlakyCache::failing_set(&["bad"]));
    let data = HashMap::from([("bad".to_string(), Bytes::from("x"))]);

    let err = cache.set_many(data, None, None).await.unwrap_err();
    assert!(matches!(err, CacheError::Backend { .. }));
}

#[tokio::test]
async fn test_delete_error_propagates_unchanged() {
    let cache = NamespacedCache::new(FlakyCache::failing_delete(&["a.b"]));
    cache.set("a.b", "x", None, None).await.unwrap();

    let err = cache.delete("a.b", None).await.unwrap_err();
    assert!(matches!(err, CacheError::Other(_)));
    assert_eq!(err.to_string(), "connection reset while deleting a.b");

    // Value and index entry both survive
    assert!(cache.has_key("a.b", None).await.unwrap());
    assert_eq!(cache.get_keys(Some("a"), None).await.unwrap(), vec!["a.b"]);
}

#[tokio::test]
async fn test_delete_keys_stops_at_failure() {
    let cache = NamespacedCache::new(FlakyCache::failing_delete(&["c.c"]));
    for key in ["c.a", "c.b", "c.c", "c.d", "x"] {
        cache.set(key, "v", None, None).await.unwrap();
    }

    let err = cache.delete_keys(Some("c"), None).await.unwrap_err();
    assert!(matches!(err, CacheError::Other(_)));

    // The failing key is untouched and keys outside the pattern survive
    assert!(cache.has_key("c.c", None).await.unwrap());
    assert!(cache
        .get_keys(Some("c"), None)
        .await
        .unwrap()
        .contains(&"c.c".to_string()));
    assert!(cache.has_key("x", None).await.unwrap());
}

#[tokio::test]
async fn test_delete_many_stops_at_failure() {
    let cache = NamespacedCache::new(FlakyCache::failing_delete(&["a.fail"]));
    cache.set("a.fail", "v", None, None).await.unwrap();
    cache.set("a.after", "v", None, None).await.unwrap();

    let result = cache.delete_many(&["a.fail", "a.after"], None).await;
    assert!(result.is_err());

    // Nothing after the failing element was attempted
    assert!(cache.has_key("a.after", None).await.unwrap());
}
