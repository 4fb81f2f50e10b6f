//! A cache that never holds anything.

use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;

use crate::contract::Cache;
use crate::error::{CacheError, CacheResult};

/// Cache backend that reports every entry as missing.
///
/// Stores are accepted and dropped, so every lookup is a guaranteed miss.
/// `remove` is a no-op success; `retrieve` fails with `NotFound`.
#[derive(Debug, Clone, Copy, Default)]
pub struct PseudoCache;

impl PseudoCache {
    /// Create a new pseudo cache.
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Cache for PseudoCache {
    async fn exists(&self, _key: &str) -> CacheResult<bool> {
        Ok(false)
    }

    async fn is_outdated(&self, _key: &str) -> CacheResult<bool> {
        Ok(true)
    }

    async fn store(&self, _key: &str, _value: &Value) -> CacheResult<()> {
        Ok(())
    }

    async fn retrieve(&self, key: &str) -> CacheResult<Value> {
        Err(CacheError::not_found(key))
    }

    async fn remove(&self, _key: &str) -> CacheResult<()> {
        Ok(())
    }

    async fn remaining_lifetime(&self, _key: &str) -> CacheResult<Duration> {
        Ok(Duration::ZERO)
    }
}
