//! Document pipeline error types.

use docpipe_cache::CacheError;
use docpipe_transform::TransformError;
use thiserror::Error;

/// Result type for document operations.
pub type DocumentResult<T> = Result<T, DocumentError>;

/// Errors returned by a [`Document`](crate::Document).
///
/// Errors raised by caller-supplied collaborators (retriever, URI and cache-id
/// sources, transform functions) are passed through unchanged and can be
/// recovered with `downcast_ref`.
#[derive(Error, Debug)]
pub enum DocumentError {
    /// The document was defined without a required collaborator.
    #[error("invalid document configuration: {0}")]
    Config(String),

    /// Deriving the document's URI failed.
    #[error(transparent)]
    Uri(anyhow::Error),

    /// Deriving the cache key failed.
    #[error(transparent)]
    CacheId(anyhow::Error),

    /// The retriever failed.
    #[error(transparent)]
    Retrieval(anyhow::Error),

    /// A cache operation failed.
    #[error(transparent)]
    Cache(#[from] CacheError),

    /// Transformation failed.
    #[error(transparent)]
    Transform(#[from] TransformError),
}
