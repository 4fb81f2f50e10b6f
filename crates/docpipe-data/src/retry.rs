//! Retry policies for retrievers.

use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;

use crate::retriever::Retriever;

/// Backoff strategy between retry attempts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackoffStrategy {
    /// No delay between retries.
    None,
    /// Fixed delay between retries.
    Fixed(Duration),
    /// Exponential backoff with base and max.
    Exponential {
        /// Initial delay.
        base: Duration,
        /// Maximum delay.
        max: Duration,
    },
}

impl BackoffStrategy {
    /// Calculate delay for a given attempt number (0-indexed).
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        match self {
            Self::None => Duration::ZERO,
            Self::Fixed(d) => *d,
            Self::Exponential { base, max } => {
                let multiplier = 2u32.saturating_pow(attempt);
                std::cmp::min(base.saturating_mul(multiplier), *max)
            }
        }
    }
}

impl Default for BackoffStrategy {
    fn default() -> Self {
        Self::Exponential {
            base: Duration::from_millis(50),
            max: Duration::from_millis(500),
        }
    }
}

/// Retry policy configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Maximum number of retries after the first attempt.
    pub max_attempts: u32,
    /// Backoff strategy.
    pub backoff: BackoffStrategy,
}

impl RetryPolicy {
    /// Create a new retry policy.
    pub fn new(max_attempts: u32) -> Self {
        Self {
            max_attempts,
            backoff: BackoffStrategy::default(),
        }
    }

    /// Create a policy with no retries.
    pub fn none() -> Self {
        Self {
            max_attempts: 0,
            backoff: BackoffStrategy::None,
        }
    }

    /// Set backoff strategy.
    pub fn with_backoff(mut self, strategy: BackoffStrategy) -> Self {
        self.backoff = strategy;
        self
    }

    /// Check if another retry is allowed after `attempt` retries.
    pub fn should_retry(&self, attempt: u32) -> bool {
        attempt < self.max_attempts
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(1)
    }
}

/// Retriever that retries failed retrievals according to a [`RetryPolicy`].
///
/// The error of the final attempt is returned unmodified.
#[derive(Debug, Clone)]
pub struct RetryingRetriever<R> {
    inner: R,
    policy: RetryPolicy,
}

impl<R: Retriever> RetryingRetriever<R> {
    /// Wrap a retriever.
    pub fn new(inner: R, policy: RetryPolicy) -> Self {
        Self { inner, policy }
    }

    /// The active policy.
    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }
}

#[async_trait]
impl<R: Retriever> Retriever for RetryingRetriever<R> {
    async fn retrieve(&self, uri: &str, options: &Value) -> anyhow::Result<Value> {
        let mut attempt = 0;

        loop {
            match self.inner.retrieve(uri, options).await {
                Ok(raw) => return Ok(raw),
                Err(e) if self.policy.should_retry(attempt) => {
                    let delay = self.policy.backoff.delay_for_attempt(attempt);
                    tracing::debug!(
                        uri,
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        error = %e,
                        "retrying retrieval"
                    );

                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }
}
