//! Namespace configuration.
//!
//! All knobs are fixed when a [`NamespacedCache`](crate::NamespacedCache) is
//! built; none of them can change per call.
//!
//! | Environment Variable | Description |
//! |---------------------|-------------|
//! | `NSCACHE_DIVISOR` | Segment divisor (default: `.`) |
//! | `NSCACHE_ROOT_KEY` | Index key holding every root segment (default: `__root-keys__`) |
//! | `NSCACHE_BASE_PREFIX` | Prefix of the per-root index keys (default: `__keys-list__`) |

use serde::{Deserialize, Serialize};

use crate::error::{CacheError, CacheResult};

/// Default segment divisor.
pub const DEFAULT_DIVISOR: &str = ".";

/// Default reserved key for the set of root segments.
pub const DEFAULT_ROOT_KEY: &str = "__root-keys__";

/// Default reserved prefix for the per-root base key sets.
pub const DEFAULT_BASE_PREFIX: &str = "__keys-list__";

/// Namespace configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamespaceConfig {
    /// Separator between key segments.
    #[serde(default = "default_divisor")]
    pub divisor: String,

    /// Reserved key storing the set of root segments.
    #[serde(default = "default_root_key")]
    pub root_key: String,

    /// Reserved prefix; `base_prefix + root` stores that root's base keys.
    #[serde(default = "default_base_prefix")]
    pub base_prefix: String,
}

fn default_divisor() -> String {
    DEFAULT_DIVISOR.to_string()
}

fn default_root_key() -> String {
    DEFAULT_ROOT_KEY.to_string()
}

fn default_base_prefix() -> String {
    DEFAULT_BASE_PREFIX.to_string()
}

impl Default for NamespaceConfig {
    fn default() -> Self {
        Self {
            divisor: default_divisor(),
            root_key: default_root_key(),
            base_prefix: default_base_prefix(),
        }
    }
}

impl NamespaceConfig {
    /// Create config from environment variables, falling back to defaults.
    ///
    /// Empty variables are treated as unset.
    pub fn from_env() -> Self {
        Self {
            divisor: env_or("NSCACHE_DIVISOR", default_divisor),
            root_key: env_or("NSCACHE_ROOT_KEY", default_root_key),
            base_prefix: env_or("NSCACHE_BASE_PREFIX", default_base_prefix),
        }
    }

    /// Set the divisor.
    pub fn with_divisor(mut self, divisor: impl Into<String>) -> Self {
        self.divisor = divisor.into();
        self
    }

    /// Set the reserved root-set key.
    pub fn with_root_key(mut self, root_key: impl Into<String>) -> Self {
        self.root_key = root_key.into();
        self
    }

    /// Set the reserved base-set prefix.
    pub fn with_base_prefix(mut self, base_prefix: impl Into<String>) -> Self {
        self.base_prefix = base_prefix.into();
        self
    }

    /// Check the configuration.
    ///
    /// The divisor must be non-empty and must not occur inside either reserved
    /// marker, otherwise index keys would split into user-visible segments.
    pub fn validate(&self) -> CacheResult<()> {
        if self.divisor.is_empty() {
            return Err(CacheError::Config {
                message: "divisor must not be empty".to_string(),
            });
        }
        if self.root_key.is_empty() || self.base_prefix.is_empty() {
            return Err(CacheError::Config {
                message: "reserved index keys must not be empty".to_string(),
            });
        }
        if self.root_key == self.base_prefix {
            return Err(CacheError::Config {
                message: format!(
                    "root key and base prefix must differ (both '{}')",
                    self.root_key
                ),
            });
        }
        for marker in [&self.root_key, &self.base_prefix] {
            if marker.contains(self.divisor.as_str()) {
                return Err(CacheError::Config {
                    message: format!(
                        "reserved key '{}' contains the divisor '{}'",
                        marker, self.divisor
                    ),
                });
            }
        }
        Ok(())
    }
}

fn env_or(var: &str, default: fn() -> String) -> String {
    std::env::var(var)
        .ok()
        .filter(|v| !v.is_empty())
        .unwrap_or_else(default)
}
