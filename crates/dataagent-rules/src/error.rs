//! Rule engine and memory loader error types.

use thiserror::Error;

/// Errors from rule matching, merging, or memory loading.
#[derive(Debug, Error)]
pub enum RuleError {
    /// A `file_match` rule had no `file_match_pattern` set.
    #[error("rule '{name}' has inclusion=file_match but no file_match_pattern")]
    MalformedRule {
        /// The offending rule's name.
        name: String,
    },
}

/// Result type for rule engine operations.
pub type RuleResult<T> = Result<T, RuleError>;
