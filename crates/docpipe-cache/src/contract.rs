//! The capability set shared by every cache backend.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::CacheResult;

/// Cache backend trait.
///
/// Entries are whole JSON values keyed by a cache key. A store always replaces
/// the previous entry and resets its age to zero. An entry is outdated once its
/// age reaches the backend's configured lifetime, so a zero lifetime makes every
/// entry outdated on the next check while still persisting it.
///
/// `is_outdated` and `remaining_lifetime` expect the key to exist; callers check
/// `exists` first (or use [`Cache::is_fresh`]). Backends fail with
/// [`CacheError::NotFound`](crate::CacheError::NotFound) when it does not.
#[async_trait]
pub trait Cache: Send + Sync {
    /// Whether an entry is present and readable. No staleness judgment.
    async fn exists(&self, key: &str) -> CacheResult<bool>;

    /// Whether the entry's age has reached the configured lifetime.
    async fn is_outdated(&self, key: &str) -> CacheResult<bool> {
        Ok(self.remaining_lifetime(key).await?.is_zero())
    }

    /// Persist a value, replacing any prior entry.
    async fn store(&self, key: &str, value: &Value) -> CacheResult<()>;

    /// Read an entry back.
    async fn retrieve(&self, key: &str) -> CacheResult<Value>;

    /// Delete an entry.
    async fn remove(&self, key: &str) -> CacheResult<()>;

    /// Time left before the entry is outdated; zero once it is.
    async fn remaining_lifetime(&self, key: &str) -> CacheResult<Duration>;

    /// Whether the entry exists and is not outdated.
    async fn is_fresh(&self, key: &str) -> CacheResult<bool> {
        Ok(self.exists(key).await? && !self.is_outdated(key).await?)
    }
}

#[async_trait]
impl<C: Cache + ?Sized> Cache for Arc<C> {
    async fn exists(&self, key: &str) -> CacheResult<bool> {
        (**self).exists(key).await
    }

    async fn is_outdated(&self, key: &str) -> CacheResult<bool> {
        (**self).is_outdated(key).await
    }

    async fn store(&self, key: &str, value: &Value) -> CacheResult<()> {
        (**self).store(key, value).await
    }

    async fn retrieve(&self, key: &str) -> CacheResult<Value> {
        (**self).retrieve(key).await
    }

    async fn remove(&self, key: &str) -> CacheResult<()> {
        (**self).remove(key).await
    }

    async fn remaining_lifetime(&self, key: &str) -> CacheResult<Duration> {
        (**self).remaining_lifetime(key).await
    }

    async fn is_fresh(&self, key: &str) -> CacheResult<bool> {
        (**self).is_fresh(key).await
    }
}

/// Remaining lifetime for an entry of the given age, floored at zero.
pub fn remaining(lifetime: Duration, age: Duration) -> Duration {
    if age >= lifetime {
        Duration::ZERO
    } else {
        lifetime - age
    }
}
