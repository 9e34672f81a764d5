//! Connection/session manager error types.

use thiserror::Error;

/// Errors from the connection manager or session manager.
#[derive(Debug, Error)]
pub enum SessionError {
    /// `connect` was refused: `total >= max_total`.
    #[error("connection capacity exceeded")]
    CapacityExceeded,
    /// The underlying session store failed.
    #[error(transparent)]
    Storage(#[from] dataagent_storage::StorageError),
}

/// Result type for connection/session manager operations.
pub type SessionResult<T> = Result<T, SessionError>;
