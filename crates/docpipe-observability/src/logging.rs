//! Subscriber configuration.

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing_subscriber::EnvFilter;

/// Environment variable that overrides the configured filter.
pub const FILTER_ENV: &str = "RUST_LOG";

/// Log level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl LogLevel {
    /// Directive string understood by `EnvFilter`.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Trace => "trace",
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.as_str().to_uppercase())
    }
}

/// Output format for logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// JSON format (for production/log aggregation).
    #[default]
    Json,
    /// Human-readable format (for development).
    Human,
}

/// Subscriber configuration.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// Default level for every target.
    pub level: LogLevel,
    /// Output format.
    pub format: LogFormat,
    /// Extra `EnvFilter` directives, e.g. `docpipe_cache=trace`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filter: Option<String>,
}

impl LogConfig {
    /// Create a configuration with a default level.
    pub fn new(level: LogLevel) -> Self {
        Self {
            level,
            ..Self::default()
        }
    }

    /// Set output format.
    pub fn with_format(mut self, format: LogFormat) -> Self {
        self.format = format;
        self
    }

    /// Add filter directives.
    pub fn with_filter(mut self, filter: impl Into<String>) -> Self {
        self.filter = Some(filter.into());
        self
    }

    /// Filter directives: the level, then any extra directives.
    pub fn directives(&self) -> String {
        match self.filter.as_deref().map(str::trim) {
            Some(extra) if !extra.is_empty() => format!("{},{}", self.level.as_str(), extra),
            _ => self.level.as_str().to_string(),
        }
    }

    /// Build the filter from this configuration alone.
    pub fn env_filter(&self) -> Result<EnvFilter, ObservabilityError> {
        EnvFilter::try_new(self.directives())
            .map_err(|e| ObservabilityError::Filter(e.to_string()))
    }
}

/// Errors raised while installing a subscriber.
#[derive(Debug, thiserror::Error)]
pub enum ObservabilityError {
    /// Filter directives could not be parsed.
    #[error("invalid log filter: {0}")]
    Filter(String),

    /// A global subscriber is already installed.
    #[error("failed to install tracing subscriber: {0}")]
    Init(String),
}

/// Install a global `tracing` subscriber writing to stderr.
///
/// `RUST_LOG`, when set and valid, takes precedence over the configured
/// directives. Fails instead of panicking if a subscriber already exists.
pub fn init_tracing(config: &LogConfig) -> Result<(), ObservabilityError> {
    let filter = match EnvFilter::try_from_env(FILTER_ENV) {
        Ok(filter) => filter,
        Err(_) => config.env_filter()?,
    };

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);

    let installed = match config.format {
        LogFormat::Json => builder.json().try_init(),
        LogFormat::Human => builder.try_init(),
    };

    installed.map_err(|e| ObservabilityError::Init(e.to_string()))
}
