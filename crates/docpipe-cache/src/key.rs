//! Cache key derivation.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// A cache key indexing both the raw and the transformed cache.
///
/// Keys must be deterministic for a given document address; otherwise no
/// lookup would ever hit.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CacheKey(String);

impl CacheKey {
    /// Create a cache key from a string.
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    /// Content hash of a URI: SHA-256, lowercase hex.
    pub fn from_uri(uri: &str) -> Self {
        Self(content_hash(uri))
    }

    /// Get the key string.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consume into the key string.
    pub fn into_string(self) -> String {
        self.0
    }
}

impl std::fmt::Display for CacheKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for CacheKey {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for CacheKey {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl AsRef<str> for CacheKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Hex-encoded SHA-256 digest of a string.
pub fn content_hash(input: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(input.as_bytes());
    hex::encode(hasher.finalize())
}
