//! Streaming dispatcher error types.

use thiserror::Error;

/// Errors from dispatching one turn.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// The connection manager rejected the turn: no live channel for this
    /// session.
    #[error("no live channel for this session")]
    NoChannel,
    /// The underlying session or message store failed.
    #[error(transparent)]
    Storage(#[from] dataagent_storage::StorageError),
}

/// Result type for dispatcher operations.
pub type DispatchResult<T> = Result<T, DispatchError>;
