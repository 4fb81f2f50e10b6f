//! Cache contract and TTL-based cache backends for the document pipeline.
//!
//! This crate provides:
//! - `Cache` - The capability set every cache backend exposes
//! - `FileCache` - One file per entry, lifetime derived from the file's mtime
//! - `MemoryCache` - In-process backend with the same TTL semantics
//! - `PseudoCache` - Never reports a hit; used when caching is disabled
//! - `CacheKey` - Deterministic keys derived from document addresses
//!
//! # Example
//!
//! ```ignore
//! use docpipe_cache::{Cache, FileCache, FileCacheConfig};
//!
//! let cache = FileCache::new(FileCacheConfig::new("cache/raw").with_lifetime_secs(300));
//!
//! cache.store("abc", &serde_json::json!({ "id": 1 })).await?;
//! assert!(cache.is_fresh("abc").await?);
//! ```

mod config;
mod contract;
mod error;
mod file;
mod key;
mod memory;
mod pseudo;

pub use config::*;
pub use contract::*;
pub use error::*;
pub use file::*;
pub use key::*;
pub use memory::*;
pub use pseudo::*;
