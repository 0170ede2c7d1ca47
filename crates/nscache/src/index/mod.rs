//! Namespace index stored inside the wrapped cache.
//!
//! Two entry families make dotted keys enumerable on a cache that can only
//! address exact keys:
//!
//! ```text
//! __root-keys__        -> ["a", "b", "main"]
//! __keys-list__main    -> ["", "footer.articles", "footer.links"]
//! ```
//!
//! A key is indexed iff its root is in the root set and its base is in that
//! root's base set. The index is a membership ledger: it does not follow
//! values that the wrapped cache expires or evicts on its own.
//!
//! Root entries are never pruned, even when a root's base set becomes empty.
//! Only [`NamespaceIndex::reset`] drops them.

mod codec;
mod locks;

use std::collections::BTreeSet;
use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::debug;

use crate::backend::FlatCache;
use crate::error::CacheResult;
use crate::router::KeyRouter;

use codec::{decode_key_set, encode_key_set, KeySet};
use locks::IndexLocks;

/// Secondary index of live dotted keys, grouped by root segment.
///
/// Mutations of one index entry are serialized through an in-process lock,
/// which prevents lost updates between tasks sharing this index. Writers in
/// other processes that share the wrapped cache are not covered.
///
/// Slot locks exist only while an entry is being mutated, so the lock table
/// stays bounded by the number of concurrent mutations, not by the number of
/// roots or versions ever seen.
pub struct NamespaceIndex<C> {
    cache: Arc<C>,
    router: KeyRouter,
    locks: IndexLocks,
    /// Mutations hold the read side, [`reset`](Self::reset) the write side.
    epoch: RwLock<()>,
}

impl<C: FlatCache> NamespaceIndex<C> {
    /// Create an index over `cache`.
    pub fn new(cache: Arc<C>, router: KeyRouter) -> Self {
        Self {
            cache,
            router,
            locks: IndexLocks::default(),
            epoch: RwLock::new(()),
        }
    }

    /// Record `root`/`base` as present. Idempotent.
    pub async fn record_key(
        &self,
        root: &str,
        base: &str,
        version: Option<&str>,
    ) -> CacheResult<()> {
        let _epoch = self.epoch.read().await;
        let base_key = self.router.base_index_key(root);
        self.insert_member(&base_key, base, version).await?;
        self.insert_member(self.router.root_index_key(), root, version).await?;
        Ok(())
    }

    /// Remove `base` from the base set of `root`. No-op if absent.
    ///
    /// The root stays in the root set even if its base set becomes empty.
    pub async fn forget_key(
        &self,
        root: &str,
        base: &str,
        version: Option<&str>,
    ) -> CacheResult<()> {
        let _epoch = self.epoch.read().await;
        let base_key = self.router.base_index_key(root);
        self.remove_member(&base_key, base, version).await?;
        Ok(())
    }

    /// Every indexed full key under `root`, in no particular order.
    pub async fn list_under_root(
        &self,
        root: &str,
        version: Option<&str>,
    ) -> CacheResult<Vec<String>> {
        let base_key = self.router.base_index_key(root);
        let bases = self.read_set(&base_key, version).await?;
        Ok(bases
            .iter()
            .map(|base| self.router.join(root, base))
            .collect())
    }

    /// Every indexed full key.
    pub async fn list_all(&self, version: Option<&str>) -> CacheResult<BTreeSet<String>> {
        let roots = self.roots(version).await?;
        let mut keys = BTreeSet::new();
        for root in &roots {
            keys.extend(self.list_under_root(root, version).await?);
        }
        debug!(
            roots = roots.len(),
            keys = keys.len(),
            ?version,
            "listed all keys"
        );
        Ok(keys)
    }

    /// Every recorded root segment.
    pub async fn roots(&self, version: Option<&str>) -> CacheResult<BTreeSet<String>> {
        self.read_set(self.router.root_index_key(), version).await
    }

    /// Drop the whole index.
    ///
    /// Delegates to the wrapped cache's `clear`, which removes every entry of
    /// every version, values included.
    ///
    /// Waits for in-flight index mutations and blocks new ones until the
    /// clear is done, so no mutation writes back a set read before it.
    pub async fn reset(&self) -> CacheResult<()> {
        let _epoch = self.epoch.write().await;
        self.cache.clear().await?;
        self.locks.clear().await;
        debug!("reset namespace index");
        Ok(())
    }

    async fn insert_member(
        &self,
        index_key: &str,
        member: &str,
        version: Option<&str>,
    ) -> CacheResult<bool> {
        let changed = self
            .mutate_set(index_key, version, |set| set.insert(member.to_string()))
            .await?;
        if changed {
            debug!(index_key, member, ?version, "recorded index member");
        }
        Ok(changed)
    }

    async fn remove_member(
        &self,
        index_key: &str,
        member: &str,
        version: Option<&str>,
    ) -> CacheResult<bool> {
        let changed = self
            .mutate_set(index_key, version, |set| set.remove(member))
            .await?;
        if changed {
            debug!(index_key, member, ?version, "removed index member");
        }
        Ok(changed)
    }

    /// Run `update_set` for one index entry under its slot lock, then drop
    /// the slot if no other task is waiting on it.
    ///
    /// Callers hold the epoch read guard.
    async fn mutate_set(
        &self,
        index_key: &str,
        version: Option<&str>,
        mutate: impl FnOnce(&mut KeySet) -> bool,
    ) -> CacheResult<bool> {
        let slot = self.locks.slot(index_key, version).await;
        let result = {
            let _guard = slot.lock().await;
            self.update_set(index_key, version, mutate).await
        };
        self.locks.release(index_key, version, slot).await;
        result
    }

    /// Only writes the entry back when `mutate` reports a change.
    async fn update_set(
        &self,
        index_key: &str,
        version: Option<&str>,
        mutate: impl FnOnce(&mut KeySet) -> bool,
    ) -> CacheResult<bool> {
        let mut set = self.read_set(index_key, version).await?;
        if !mutate(&mut set) {
            return Ok(false);
        }
        self.write_set(index_key, &set, version).await?;
        Ok(true)
    }

    async fn read_set(&self, index_key: &str, version: Option<&str>) -> CacheResult<KeySet> {
        let raw = self.cache.get(index_key, version).await?;
        decode_key_set(index_key, raw)
    }

    async fn write_set(
        &self,
        index_key: &str,
        set: &KeySet,
        version: Option<&str>,
    ) -> CacheResult<()> {
        let bytes = encode_key_set(index_key, set)?;
        self.cache.set(index_key, bytes, None, version).await
    }
}
