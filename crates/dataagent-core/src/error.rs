//! Shared error type for the core data model.

use thiserror::Error;

/// Errors surfaced while decoding or validating core data-model values.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CoreError {
    /// A rule's `file_match_pattern` was invalid glob syntax.
    #[error("invalid glob pattern: {0}")]
    InvalidPattern(String),

    /// A rule declared `inclusion = file_match` without a pattern.
    #[error("rule {name:?} has inclusion=file_match but no file_match_pattern")]
    MissingFileMatchPattern {
        /// The offending rule's name.
        name: String,
    },
}

/// Result type for core data-model operations.
pub type CoreResult<T> = Result<T, CoreError>;
