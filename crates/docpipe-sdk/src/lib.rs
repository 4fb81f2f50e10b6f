//! Public SDK for the cached document pipeline.
//!
//! This crate re-exports the pipeline crates:
//!
//! ```ignore
//! use docpipe_sdk::prelude::*;
//! use serde_json::json;
//!
//! let document = Document::builder()
//!     .name("Product")
//!     .uri_template("https://api.example.com/products/{id}")
//!     .retriever(retriever_fn(|uri, _options| async move { fetch(&uri).await }))
//!     .transformer(ObjectSpec::new().include("id").path("title", "name.en"))
//!     .raw_cache(FileCache::new(FileCacheConfig::new("cache/raw").with_lifetime_secs(300)))
//!     .transformed_cache(MemoryCache::new(Duration::from_secs(60)))
//!     .build()?;
//!
//! let product = document.get("42", &json!({})).await?;
//! ```

pub use docpipe_cache;
pub use docpipe_data;
pub use docpipe_observability;
pub use docpipe_transform;

/// Prelude for convenient imports.
pub mod prelude {
    pub use docpipe_cache::*;
    pub use docpipe_data::*;
    pub use docpipe_observability::*;
    pub use docpipe_transform::*;
    pub use std::time::Duration;
}
