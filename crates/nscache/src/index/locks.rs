//! Per-index-entry locks.
//!
//! Each index entry (the root set, or one root's base set) of one version gets
//! its own async mutex, so read-modify-write cycles on the same entry are
//! serialized while different roots proceed in parallel. A slot lives only as
//! long as some task holds or waits on it.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::Mutex;

type SlotKey = (Option<String>, String);

#[derive(Debug, Default)]
pub(crate) struct IndexLocks {
    slots: Mutex<HashMap<SlotKey, Arc<Mutex<()>>>>,
}

impl IndexLocks {
    /// Lock guarding `index_key` in `version`, created on first use.
    pub(crate) async fn slot(&self, index_key: &str, version: Option<&str>) -> Arc<Mutex<()>> {
        let mut slots = self.slots.lock().await;
        slots
            .entry((version.map(String::from), index_key.to_string()))
            .or_default()
            .clone()
    }

    /// Hand back a slot obtained from [`slot`](Self::slot) after its guard is
    /// dropped. The map entry is removed when no other task holds a handle.
    pub(crate) async fn release(
        &self,
        index_key: &str,
        version: Option<&str>,
        slot: Arc<Mutex<()>>,
    ) {
        let mut slots = self.slots.lock().await;
        let key = (version.map(String::from), index_key.to_string());
        // One handle in the map, one in `slot`
        let idle = slots.get(&key).is_some_and(|current| {
            Arc::ptr_eq(current, &slot) && Arc::strong_count(&slot) == 2
        });
        if idle {
            slots.remove(&key);
        }
    }

    /// Forget every lock. Holders of a previous slot keep it until they drop it.
    pub(crate) async fn clear(&self) {
        self.slots.lock().await.clear();
    }

    #[cfg(test)]
    pub(crate) async fn len(&self) -> usize {
        self.slots.lock().await.len()
    }
}
