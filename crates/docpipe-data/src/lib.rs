//! Document pipeline: retrieval, caching and transformation.
//!
//! This crate provides:
//! - `Document` - `(id, options) -> transformed document` with two cache layers
//! - `Retriever` - The external source of raw data
//! - `UriSource` / `CacheIdSource` - Address and cache-key derivation
//! - `RetryingRetriever` / `TimeoutRetriever` - Opt-in retriever wrappers
//!
//! # Example
//!
//! ```ignore
//! use docpipe_cache::{FileCache, FileCacheConfig};
//! use docpipe_data::{retriever_fn, Document};
//!
//! let issues = Document::builder()
//!     .name("Issue")
//!     .retriever(retriever_fn(|uri, _options| async move { fetch_json(&uri).await }))
//!     .uri_template("https://api.example.com/issues/{id}")
//!     .raw_cache(FileCache::new(FileCacheConfig::new("cache/raw").with_lifetime_secs(600)))
//!     .transformer(issue_spec)
//!     .build()?;
//!
//! let issue = issues.get("42", &serde_json::Value::Null).await?;
//! ```

mod document;
mod error;
mod retriever;
mod retry;
mod timeout;
mod uri;

pub use document::*;
pub use error::*;
pub use retriever::*;
pub use retry::*;
pub use timeout::*;
pub use uri::*;
