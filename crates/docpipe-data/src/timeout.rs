//! Timeouts for retrievers.

use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;

use crate::retriever::Retriever;

/// Error when a retrieval exceeds its time budget.
#[derive(Debug, Clone, thiserror::Error)]
#[error("retrieval of {uri} timed out after {after:?}")]
pub struct RetrievalTimeout {
    /// The URI being retrieved.
    pub uri: String,
    /// The budget that was exceeded.
    pub after: Duration,
}

/// Retriever that fails with [`RetrievalTimeout`] when the inner retriever is too slow.
#[derive(Debug, Clone)]
pub struct TimeoutRetriever<R> {
    inner: R,
    total: Duration,
}

impl<R: Retriever> TimeoutRetriever<R> {
    /// Wrap a retriever with a total time budget per retrieval.
    pub fn new(inner: R, total: Duration) -> Self {
        Self { inner, total }
    }

    /// The time budget.
    pub fn total(&self) -> Duration {
        self.total
    }
}

#[async_trait]
impl<R: Retriever> Retriever for TimeoutRetriever<R> {
    async fn retrieve(&self, uri: &str, options: &Value) -> anyhow::Result<Value> {
        match tokio::time::timeout(self.total, self.inner.retrieve(uri, options)).await {
            Ok(result) => result,
            Err(_) => {
                tracing::debug!(
                    uri,
                    after_ms = self.total.as_millis() as u64,
                    "retrieval timed out"
                );
                Err(RetrievalTimeout {
                    uri: uri.to_string(),
                    after: self.total,
                }
                .into())
            }
        }
    }
}
