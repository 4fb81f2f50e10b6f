//! In-process cache backend.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::RwLock;

use crate::contract::{remaining, Cache};
use crate::error::{CacheError, CacheResult};

#[derive(Debug, Clone)]
struct MemoryEntry {
    value: Value,
    stored_at: Instant,
}

/// In-memory cache backend (for tests and short-lived processes).
///
/// Ages are measured from the instant of the last `store`. Absent keys behave
/// like the file cache: `retrieve`, `remove` and the lifetime queries fail with
/// `NotFound`.
#[derive(Debug, Default)]
pub struct MemoryCache {
    lifetime: Duration,
    entries: RwLock<HashMap<String, MemoryEntry>>,
}

impl MemoryCache {
    /// Create an in-memory cache whose entries live for `lifetime`.
    pub fn new(lifetime: Duration) -> Self {
        Self {
            lifetime,
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// Configured entry lifetime.
    pub fn lifetime(&self) -> Duration {
        self.lifetime
    }

    /// Number of stored entries, outdated ones included.
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    /// Whether nothing is stored.
    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }

    /// Drop every entry.
    pub async fn clear(&self) {
        self.entries.write().await.clear();
    }
}

#[async_trait]
impl Cache for MemoryCache {
    async fn exists(&self, key: &str) -> CacheResult<bool> {
        Ok(self.entries.read().await.contains_key(key))
    }

    async fn store(&self, key: &str, value: &Value) -> CacheResult<()> {
        let entry = MemoryEntry {
            value: value.clone(),
            stored_at: Instant::now(),
        };
        self.entries.write().await.insert(key.to_string(), entry);

        tracing::trace!(key, "memory cache entry stored");
        Ok(())
    }

    async fn retrieve(&self, key: &str) -> CacheResult<Value> {
        self.entries
            .read()
            .await
            .get(key)
            .map(|entry| entry.value.clone())
            .ok_or_else(|| CacheError::not_found(key))
    }

    async fn remove(&self, key: &str) -> CacheResult<()> {
        self.entries
            .write()
            .await
            .remove(key)
            .map(|_| ())
            .ok_or_else(|| CacheError::not_found(key))
    }

    async fn remaining_lifetime(&self, key: &str) -> CacheResult<Duration> {
        let entries = self.entries.read().await;
        let entry = entries.get(key).ok_or_else(|| CacheError::not_found(key))?;

        Ok(remaining(self.lifetime, entry.stored_at.elapsed()))
    }
}
