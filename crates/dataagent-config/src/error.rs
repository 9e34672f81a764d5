//! Configuration error types.

use thiserror::Error;

/// Errors from loading, merging, or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A config file could not be read.
    #[error("failed to read config file {path}: {source}")]
    ReadError {
        /// Path of the file that failed to read.
        path: String,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// A config file's TOML could not be parsed (or the merged tree could
    /// not be deserialized into [`crate::types::Config`]).
    #[error("failed to parse config {path}: {source}")]
    ParseError {
        /// Path of the file that failed to parse (or `"<merged config>"`).
        path: String,
        /// Underlying TOML error.
        #[source]
        source: toml::de::Error,
    },

    /// A field failed post-merge validation.
    #[error("invalid configuration field {field}: {message}")]
    ValidationError {
        /// Dotted field path (e.g. `"mcp.max_per_user"`).
        field: String,
        /// Human-readable description of the violation.
        message: String,
    },

    /// The user's home directory could not be determined.
    #[error("could not determine home directory")]
    NoHomeDir,
}

/// Result type for configuration operations.
pub type ConfigResult<T> = Result<T, ConfigError>;
