//! Logging setup for document pipeline hosts.
//!
//! The pipeline crates only emit `tracing` events. Hosts that do not install
//! their own subscriber can call [`init_tracing`].
//!
//! ```ignore
//! use docpipe_observability::{init_tracing, LogConfig, LogFormat, LogLevel};
//!
//! init_tracing(&LogConfig::new(LogLevel::Debug).with_format(LogFormat::Human))?;
//! ```

mod logging;

pub use logging::*;
