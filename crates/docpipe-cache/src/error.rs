//! Cache error types.

use std::path::PathBuf;

use thiserror::Error;

/// Result type for cache operations.
pub type CacheResult<T> = Result<T, CacheError>;

/// Errors that can occur when using a cache.
#[derive(Error, Debug)]
pub enum CacheError {
    /// No entry is stored under the key.
    #[error("cache entry not found: {key}")]
    NotFound { key: String },

    /// Reading or writing the backing storage failed.
    #[error("cache I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Failed to encode or decode a cached value.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A raw-text cache was asked to store something other than a string.
    #[error("raw text cache can only store string values (key: {key})")]
    RawTextValue { key: String },

    /// Invalid cache configuration.
    #[error("invalid cache configuration: {0}")]
    Config(String),
}

impl CacheError {
    /// Create a not-found error for a key.
    pub fn not_found(key: impl Into<String>) -> Self {
        Self::NotFound { key: key.into() }
    }

    /// Check whether this error means the entry does not exist.
    pub fn is_not_found(&self) -> bool {
        match self {
            Self::NotFound { .. } => true,
            Self::Io { source, .. } => source.kind() == std::io::ErrorKind::NotFound,
            _ => false,
        }
    }
}
