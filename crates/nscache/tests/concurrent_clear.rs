//! `clear()` racing an index write.
//!
//! The wrapped cache parks the first read of one index entry until the test
//! lets it go, which holds a `set` between reading and writing back its
//! base set.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use nscache::{CacheResult, FlatCache, MemoryCache, NamespacedCache};
use tokio::sync::Notify;

/// MemoryCache that pauses one read of `gate_key` once armed.
struct GatedCache {
    inner: MemoryCache,
    gate_key: String,
    armed: AtomicBool,
    reached: Notify,
    release: Notify,
}

impl GatedCache {
    fn new(gate_key: &str) -> Self {
        Self {
            inner: MemoryCache::new(),
            gate_key: gate_key.to_string(),
            armed: AtomicBool::new(false),
            reached: Notify::new(),
            release: Notify::new(),
        }
    }

    fn arm(&self) {
        self.armed.store(true, Ordering::SeqCst);
    }
}

#[async_trait]
impl FlatCache for GatedCache {
    async fn get(&self, key: &str, version: Option<&str>) -> CacheResult<Option<Bytes>> {
        let value = self.inner.get(key, version).await?;
        if key == self.gate_key && self.armed.swap(false, Ordering::SeqCst) {
            self.reached.notify_one();
            self.release.notified().await;
        }
        Ok(value)
    }

    async fn set(
        &self,
        key: &str,
        value: Bytes,
        ttl: Option<Duration>,
        version: Option<&str>,
    ) -> CacheResult<()> {
        self.inner.set(key, value, ttl, version).await
    }

    async fn delete(&self, key: &str, version: Option<&str>) -> CacheResult<()> {
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

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_clear_waits_for_in_flight_index_write() {
    let cache = Arc::new(NamespacedCache::new(GatedCache::new("__keys-list__a")));
    cache.set("a.x", "1", None, None).await.unwrap();

    // Park the next set after it has read the base set ["x"]
    cache.inner().arm();
    let writer = {
        let cache = cache.clone();
        tokio::spawn(async move { cache.set("a.y", "2", None, None).await })
    };
    cache.inner().reached.notified().await;

    let clearer = {
        let cache = cache.clone();
        tokio::spawn(async move { cache.clear().await })
    };
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(!clearer.is_finished(), "clear ran under an in-flight index write");

    cache.inner().release.notify_one();
    writer.await.unwrap().unwrap();
    clearer.await.unwrap().unwrap();

    // The clear ran after the write; nothing from before it is listed
    assert!(cache.get_keys(None, None).await.unwrap().is_empty());
    assert!(!cache.has_key("a.x", None).await.unwrap());
    assert!(cache.inner().inner.is_empty().await);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_set_after_clear_is_listed() {
    let cache = Arc::new(NamespacedCache::new(GatedCache::new("__keys-list__a")));
    cache.set("a.x", "1", None, None).await.unwrap();
    cache.clear().await.unwrap();

    cache.set("a.y", "2", None, None).await.unwrap();
    assert_eq!(cache.get_keys(Some("a"), None).await.unwrap(), vec!["a.y"]);
}
