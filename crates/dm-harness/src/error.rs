//! Error types for suite hooks

use dm_core::PatternError;
use dm_json::TemplateError;
use thiserror::Error;

/// Result type for suite hooks
pub type SuiteResult<T> = Result<T, SuiteError>;

/// Error raised by a suite hook
#[derive(Debug, Error)]
pub enum SuiteError {
    #[error("{0}")]
    Hook(String),

    #[error("invalid pattern: {0}")]
    Pattern(#[from] PatternError),

    #[error("invalid template: {0}")]
    Template(#[from] TemplateError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl SuiteError {
    pub fn hook(message: impl Into<String>) -> Self {
        SuiteError::Hook(message.into())
    }
}
