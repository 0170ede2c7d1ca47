//! Namespaced keys on top of a flat key-value cache.
//!
//! Flat caches (memcached, redis, local maps) address values by exact key
//! only. This crate keeps a small index inside the wrapped cache so dotted
//! keys become enumerable by prefix and deletable as a subtree:
//!
//! - Point reads and writes on dotted keys (`main.footer.links`)
//! - Prefix listing (`get_keys("main.")`)
//! - Cascading delete (`delete_keys("main.footer")`)
//!
//! # Quick Start
//!
//! ```
//! use nscache::{MemoryCache, NamespacedCache};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> nscache::CacheResult<()> {
//! let cache = NamespacedCache::new(MemoryCache::new());
//!
//! cache.set("main.footer.links", "[]", None, None).await?;
//! cache.set("main.footer.articles", "[]", None, None).await?;
//!
//! let mut keys = cache.get_keys(Some("main.footer"), None).await?;
//! keys.sort();
//! assert_eq!(keys, ["main.footer.articles", "main.footer.links"]);
//!
//! cache.delete_keys(Some("main."), None).await?;
//! assert!(cache.get_keys(None, None).await?.is_empty());
//! # Ok(())
//! # }
//! ```
//!
//! # Caveats
//!
//! - `delete("a")` never removes `a.b`; use `delete_keys`.
//! - Pattern matching is a string prefix: `"c.a"` also matches `c.ab`.
//! - Values the wrapped cache expires on its own stay listed until deleted.
//! - Root segments stay in the index until `clear()`.
//!
//! # Configuration
//!
//! See [`NamespaceConfig`]; the divisor and reserved index keys can come from
//! the environment via [`NamespaceConfig::from_env`].

pub mod backend;
pub mod config;
pub mod error;
pub mod facade;
pub mod index;
pub mod router;

// Re-export main types
pub use backend::{FlatCache, MemoryCache};
pub use config::{NamespaceConfig, DEFAULT_BASE_PREFIX, DEFAULT_DIVISOR, DEFAULT_ROOT_KEY};
pub use error::{CacheError, CacheResult};
pub use facade::NamespacedCache;
pub use index::NamespaceIndex;
pub use router::KeyRouter;
