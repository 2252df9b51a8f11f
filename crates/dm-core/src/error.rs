//! Error types for pattern construction

use thiserror::Error;

/// Result type for pattern operations
pub type PatternResult<T> = Result<T, PatternError>;

/// Errors raised while building a pattern or preparing an actual value.
///
/// Mismatches are never errors: they are reported in the
/// [`ComparisonResult`](crate::ComparisonResult).
#[derive(Debug, Error)]
pub enum PatternError {
    /// Regular expression did not compile
    #[error("invalid regex '{pattern}': {source}")]
    InvalidRegex {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    /// Ordering bounds of different kinds (number vs string)
    #[error("invalid bounds for {operator}: {reason}")]
    InvalidBounds { operator: String, reason: String },

    /// No operator with this name
    #[error("unknown operator: {name}")]
    UnknownOperator { name: String },

    /// Wrong number of arguments for an operator
    #[error("{operator} expects {expected} argument(s), got {got}")]
    Arity {
        operator: String,
        expected: String,
        got: usize,
    },

    /// Argument has the wrong shape
    #[error("invalid argument to {operator}: {message}")]
    InvalidArgument { operator: String, message: String },

    /// Actual value could not be converted to JSON
    #[error("failed to serialize actual value: {source}")]
    Serialize {
        #[source]
        source: serde_json::Error,
    },

    /// Captured value could not be read back as the requested type
    #[error("failed to deserialize captured slot '{slot}': {source}")]
    Capture {
        slot: String,
        #[source]
        source: serde_json::Error,
    },
}

impl PatternError {
    pub(crate) fn invalid_argument(operator: &str, message: impl Into<String>) -> Self {
        PatternError::InvalidArgument {
            operator: operator.to_string(),
            message: message.into(),
        }
    }
}
