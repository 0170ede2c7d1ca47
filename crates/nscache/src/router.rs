//! Dotted key routing.
//!
//! # Key Schema
//!
//! ```text
//! main.footer.links            # user key: root = "main", base = "footer.links"
//! __root-keys__                # index: set of every root segment
//! __keys-list__main            # index: set of every base under root "main"
//! ```
//!
//! A bare root key (`main`) is recorded under its root with the empty base.

use crate::config::NamespaceConfig;

/// Splits dotted keys into `(root, base)` and builds the reserved index keys.
#[derive(Debug, Clone)]
pub struct KeyRouter {
    divisor: String,
    root_key: String,
    base_prefix: String,
}

impl KeyRouter {
    /// Create a router from a validated config.
    pub fn new(config: &NamespaceConfig) -> Self {
        Self {
            divisor: config.divisor.clone(),
            root_key: config.root_key.clone(),
            base_prefix: config.base_prefix.clone(),
        }
    }

    /// The segment divisor.
    pub fn divisor(&self) -> &str {
        &self.divisor
    }

    /// Split a key at the first divisor.
    ///
    /// `root` is the first segment, `base` everything after the first divisor
    /// (empty for a single-segment key).
    pub fn split<'k>(&self, key: &'k str) -> (&'k str, &'k str) {
        key.split_once(self.divisor.as_str()).unwrap_or((key, ""))
    }

    /// Inverse of [`split`](Self::split).
    pub fn join(&self, root: &str, base: &str) -> String {
        if base.is_empty() {
            root.to_string()
        } else {
            format!("{}{}{}", root, self.divisor, base)
        }
    }

    /// Key holding the set of every root segment.
    pub fn root_index_key(&self) -> &str {
        &self.root_key
    }

    /// Key holding the set of every base recorded under `root`.
    pub fn base_index_key(&self, root: &str) -> String {
        format!("{}{}", self.base_prefix, root)
    }

    /// Whether a user key starts with one of the reserved markers and can
    /// therefore overwrite index entries.
    pub fn is_reserved(&self, key: &str) -> bool {
        key.starts_with(self.root_key.as_str()) || key.starts_with(self.base_prefix.as_str())
    }
}

impl Default for KeyRouter {
    fn default() -> Self {
        Self::new(&NamespaceConfig::default())
    }
}
