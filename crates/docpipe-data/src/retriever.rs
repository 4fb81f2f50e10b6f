//! The external source of raw document data.

use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

/// Fetches raw data for a URI.
///
/// Implementations are opaque to the pipeline: their errors reach the
/// pipeline's caller unmodified, and no retry happens unless the retriever is
/// wrapped (see [`RetryingRetriever`](crate::RetryingRetriever)).
#[async_trait]
pub trait Retriever: Send + Sync {
    /// Fetch the raw data behind `uri`.
    async fn retrieve(&self, uri: &str, options: &Value) -> anyhow::Result<Value>;
}

#[async_trait]
impl<R: Retriever + ?Sized> Retriever for Arc<R> {
    async fn retrieve(&self, uri: &str, options: &Value) -> anyhow::Result<Value> {
        (**self).retrieve(uri, options).await
    }
}

/// Retriever backed by an async closure taking owned `(uri, options)`.
#[derive(Clone)]
pub struct FnRetriever<F> {
    f: F,
}

/// Wrap an async closure as a [`Retriever`].
pub fn retriever_fn<F, Fut>(f: F) -> FnRetriever<F>
where
    F: Fn(String, Value) -> Fut + Send + Sync,
    Fut: Future<Output = anyhow::Result<Value>> + Send,
{
    FnRetriever { f }
}

#[async_trait]
impl<F, Fut> Retriever for FnRetriever<F>
where
    F: Fn(String, Value) -> Fut + Send + Sync,
    Fut: Future<Output = anyhow::Result<Value>> + Send,
{
    async fn retrieve(&self, uri: &str, options: &Value) -> anyhow::Result<Value> {
        (self.f)(uri.to_string(), options.clone()).await
    }
}
