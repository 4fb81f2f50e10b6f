//! File cache configuration.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{CacheError, CacheResult};

/// Configuration for a [`FileCache`](crate::FileCache).
///
/// Missing fields take their defaults, so partial TOML or JSON documents are
/// accepted:
///
/// ```toml
/// lifetime = 3600
/// directory = "cache/transformed"
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileCacheConfig {
    /// Entry lifetime in seconds. Zero makes every entry outdated immediately.
    pub lifetime: u64,
    /// Directory holding the cache files.
    pub directory: PathBuf,
    /// File extension, without the leading dot.
    pub extension: String,
    /// Whether values are JSON encoded. When false, values are stored as raw text.
    pub json: bool,
}

impl Default for FileCacheConfig {
    fn default() -> Self {
        Self {
            lifetime: 0,
            directory: PathBuf::from("cache"),
            extension: "json".to_string(),
            json: true,
        }
    }
}

impl FileCacheConfig {
    /// Create a configuration rooted at a directory, other fields defaulted.
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
            ..Self::default()
        }
    }

    /// Parse a configuration from a TOML fragment.
    pub fn from_toml_str(input: &str) -> CacheResult<Self> {
        toml::from_str(input).map_err(|e| CacheError::Config(e.to_string()))
    }

    /// Set the entry lifetime in seconds.
    pub fn with_lifetime_secs(mut self, secs: u64) -> Self {
        self.lifetime = secs;
        self
    }

    /// Set the file extension.
    pub fn with_extension(mut self, extension: impl Into<String>) -> Self {
        self.extension = extension.into();
        self
    }

    /// Store raw text instead of JSON.
    pub fn raw_text(mut self) -> Self {
        self.json = false;
        self
    }

    /// Entry lifetime as a duration.
    pub fn lifetime(&self) -> Duration {
        Duration::from_secs(self.lifetime)
    }

    /// Path of the file backing a key: `<directory>/<key>.<extension>`.
    pub fn path_for(&self, key: &str) -> PathBuf {
        self.directory.join(format!("{}.{}", key, self.extension))
    }

    /// The cache directory.
    pub fn directory(&self) -> &Path {
        &self.directory
    }
}
