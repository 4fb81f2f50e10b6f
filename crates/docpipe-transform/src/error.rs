//! Transformation error types.

use thiserror::Error;

/// Result type for transformation operations.
pub type TransformResult<T> = Result<T, TransformError>;

/// Errors raised while building or running a transformer.
#[derive(Error, Debug)]
pub enum TransformError {
    /// A spec list entry was neither a function nor an object.
    #[error("transformer specs must be functions or objects, found {found}")]
    InvalidTopLevel { found: &'static str },

    /// A property spec had a type outside the accepted set.
    #[error(
        "invalid specification for property {property}: must be one of \
         [boolean | string | function | object] but found {found}"
    )]
    InvalidSpec {
        property: String,
        found: &'static str,
    },

    /// A nested spec carried a malformed option.
    #[error("invalid `{option}` for property {property}: {reason}")]
    InvalidOption {
        property: String,
        option: &'static str,
        reason: String,
    },

    /// A user-supplied transform function failed.
    #[error(transparent)]
    Function(anyhow::Error),
}

impl TransformError {
    /// The property named by a construction-time error, if any.
    pub fn property(&self) -> Option<&str> {
        match self {
            Self::InvalidSpec { property, .. } | Self::InvalidOption { property, .. } => {
                Some(property)
            }
            _ => None,
        }
    }
}
