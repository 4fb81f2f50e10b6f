//! Declarative document transformation engine.
//!
//! A transformer threads a JSON document through one or more specs in order.
//! Each spec is either a function or an object spec mapping target property
//! names to per-property specs:
//!
//! - `true` copies the property as is, `false` excludes it
//! - a string is a dot-path into the source document
//! - a function receives the whole document
//! - a list of specs produces a list of results
//! - a nested spec selects `src`, applies `transform`, and may `iterate`
//!
//! # Example
//!
//! ```ignore
//! use docpipe_transform::{ObjectSpec, Transformer};
//!
//! let spec = ObjectSpec::from_json(&serde_json::json!({
//!     "id": true,
//!     "author": "meta.author.name",
//!     "internal": false,
//!     "comments": { "src": "data.comments", "iterate": true, "max": 5 }
//! }))?;
//!
//! let shaped = Transformer::new([spec.into()]).transform(raw).await?;
//! ```

mod error;
mod path;
mod spec;
mod transformer;

pub use error::*;
pub use path::*;
pub use spec::*;
pub use transformer::*;
