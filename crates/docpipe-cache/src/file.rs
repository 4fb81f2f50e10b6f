//! File-backed cache with mtime-derived lifetimes.

use std::io;
use std::path::Path;
use std::time::{Duration, SystemTime};

use async_trait::async_trait;
use serde_json::Value;
use tokio::fs;

use crate::config::FileCacheConfig;
use crate::contract::{remaining, Cache};
use crate::error::{CacheError, CacheResult};

/// Cache persisting each entry as `<directory>/<key>.<extension>`.
///
/// The file's modification time is the only timestamp: storing an entry
/// rewrites the file and so resets its age. `retrieve`, `remove`,
/// `remaining_lifetime` and `is_outdated` fail with `NotFound` for absent keys.
#[derive(Debug, Clone)]
pub struct FileCache {
    config: FileCacheConfig,
}

impl FileCache {
    /// Create a file cache from its configuration.
    pub fn new(config: FileCacheConfig) -> Self {
        tracing::debug!(
            lifetime_secs = config.lifetime,
            directory = %config.directory.display(),
            extension = %config.extension,
            json = config.json,
            "creating file cache"
        );
        Self { config }
    }

    /// The active configuration.
    pub fn config(&self) -> &FileCacheConfig {
        &self.config
    }

    fn encode(&self, key: &str, value: &Value) -> CacheResult<String> {
        if self.config.json {
            return Ok(serde_json::to_string(value)?);
        }

        match value {
            Value::String(text) => Ok(text.clone()),
            _ => Err(CacheError::RawTextValue {
                key: key.to_string(),
            }),
        }
    }

    fn decode(&self, contents: String) -> CacheResult<Value> {
        if self.config.json {
            Ok(serde_json::from_str(&contents)?)
        } else {
            Ok(Value::String(contents))
        }
    }
}

#[async_trait]
impl Cache for FileCache {
    async fn exists(&self, key: &str) -> CacheResult<bool> {
        let path = self.config.path_for(key);

        // Opening rather than stat-ing also rules out unreadable files.
        match fs::File::open(&path).await {
            Ok(_) => {
                tracing::trace!(path = %path.display(), "cache file exists");
                Ok(true)
            }
            Err(e) => {
                tracing::trace!(path = %path.display(), error = %e, "cannot access cache file");
                Ok(false)
            }
        }
    }

    async fn store(&self, key: &str, value: &Value) -> CacheResult<()> {
        let path = self.config.path_for(key);
        let contents = self.encode(key, value)?;

        tracing::trace!(path = %path.display(), "writing cache file");

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| io_error(key, parent, e))?;
        }
        fs::write(&path, contents)
            .await
            .map_err(|e| io_error(key, &path, e))?;

        tracing::debug!(path = %path.display(), "cache file written");
        Ok(())
    }

    async fn retrieve(&self, key: &str) -> CacheResult<Value> {
        let path = self.config.path_for(key);

        tracing::trace!(path = %path.display(), "reading cache file");

        let contents = fs::read_to_string(&path)
            .await
            .map_err(|e| io_error(key, &path, e))?;

        tracing::debug!(path = %path.display(), json = self.config.json, "cache file read");
        self.decode(contents)
    }

    async fn remove(&self, key: &str) -> CacheResult<()> {
        let path = self.config.path_for(key);

        fs::remove_file(&path)
            .await
            .map_err(|e| io_error(key, &path, e))?;

        tracing::debug!(path = %path.display(), "cache file removed");
        Ok(())
    }

    async fn remaining_lifetime(&self, key: &str) -> CacheResult<Duration> {
        let path = self.config.path_for(key);

        let mtime = fs::metadata(&path)
            .await
            .and_then(|meta| meta.modified())
            .map_err(|e| io_error(key, &path, e))?;

        // An mtime in the future counts as age zero.
        let age = SystemTime::now()
            .duration_since(mtime)
            .unwrap_or(Duration::ZERO);
        let left = remaining(self.config.lifetime(), age);

        tracing::trace!(
            path = %path.display(),
            age_secs = age.as_secs_f64(),
            lifetime_secs = self.config.lifetime,
            remaining_secs = left.as_secs_f64(),
            "computed remaining lifetime"
        );

        Ok(left)
    }
}

fn io_error(key: &str, path: &Path, source: io::Error) -> CacheError {
    if source.kind() == io::ErrorKind::NotFound {
        CacheError::not_found(key)
    } else {
        CacheError::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}
