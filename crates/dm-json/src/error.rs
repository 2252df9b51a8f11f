//! Error types for template parsing

use dm_core::PatternError;
use thiserror::Error;

/// Result type for template operations
pub type TemplateResult<T> = Result<T, TemplateError>;

/// A template could not be turned into a pattern.
///
/// `line` and `column` are 1-based; columns count characters, not bytes.
#[derive(Debug, Error)]
#[error("{kind} at line {line}, column {column}")]
pub struct TemplateError {
    pub line: usize,
    pub column: usize,
    #[source]
    pub kind: TemplateErrorKind,
}

/// What went wrong while parsing a template
#[derive(Debug, Error)]
pub enum TemplateErrorKind {
    #[error("unexpected character '{0}'")]
    UnexpectedChar(char),

    #[error("unexpected end of template")]
    UnexpectedEnd,

    /// Missing ',' or closing bracket between members
    #[error("expected {expected}, found '{found}'")]
    ExpectedSeparator { expected: &'static str, found: char },

    #[error("invalid number '{0}'")]
    InvalidNumber(String),

    #[error("invalid escape sequence: {0}")]
    InvalidEscape(String),

    #[error("unterminated comment")]
    UnterminatedComment,

    #[error("placeholder ${0} has no bound value")]
    UnknownPlaceholder(String),

    #[error("duplicate key \"{0}\"")]
    DuplicateKey(String),

    #[error("{0}")]
    Operator(#[from] PatternError),

    #[error("unexpected trailing input")]
    TrailingInput,

    #[error("template nested deeper than {limit} levels")]
    TooDeep { limit: usize },
}
