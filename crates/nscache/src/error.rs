//! Error types shared by cache backends and the namespaced facade.

use thiserror::Error;

/// Result type for cache operations.
pub type CacheResult<T> = Result<T, CacheError>;

/// Errors that can occur during cache operations.
///
/// Backends and [`NamespacedCache`](crate::NamespacedCache) share this type,
/// so a backend failure reaches the caller unchanged.
#[derive(Debug, Error)]
pub enum CacheError {
    /// The wrapped cache failed (network, I/O, server error).
    #[error("cache backend error: {message}")]
    Backend { message: String },

    /// A value or index entry could not be encoded or decoded.
    #[error("serialization error for '{key}': {message}")]
    Serialization { key: String, message: String },

    /// Invalid namespace configuration.
    #[error("configuration error: {message}")]
    Config { message: String },

    /// The operation has no well-defined interaction with the namespace index.
    #[error("operation not supported: {operation}")]
    Unsupported { operation: String },

    /// Other errors.
    #[error("{0}")]
    Other(#[from] anyhow::Error),
}

impl CacheError {
    /// Shorthand for [`CacheError::Unsupported`].
    pub fn unsupported(operation: impl Into<String>) -> Self {
        Self::Unsupported {
            operation: operation.into(),
        }
    }

    /// Returns true if the operation is not supported by the namespaced cache.
    pub fn is_unsupported(&self) -> bool {
        matches!(self, Self::Unsupported { .. })
    }

    /// Whether the error is transient and the call may be retried.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Backend { .. })
    }
}
