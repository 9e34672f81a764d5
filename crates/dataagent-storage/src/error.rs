//! Storage error types.

/// Errors from storage operations.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// The requested key or item was not found.
    #[error("not found: {0}")]
    NotFound(String),

    /// A storage operation failed.
    #[error("storage error: {0}")]
    Internal(String),

    /// Connection to the storage backend failed.
    #[error("connection error: {0}")]
    Connection(String),

    /// Serialization or deserialization failed.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// The namespace or key is invalid.
    #[error("invalid key: {0}")]
    InvalidKey(String),

    /// A schema migration failed; its transaction was rolled back and no
    /// ledger row was written.
    #[error("migration {version} failed: {reason}")]
    MigrationFailed {
        /// The migration version that failed.
        version: String,
        /// Why it failed.
        reason: String,
    },
}

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;
