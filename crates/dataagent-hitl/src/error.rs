//! HITL handler error types.

use thiserror::Error;

/// Errors from the HITL coordinator (C9).
#[derive(Debug, Error, PartialEq, Eq)]
pub enum HitlError {
    /// `resolve_decision` was called for a session with no pending slot.
    #[error("no pending HITL slot for this session")]
    NoPendingSlot,
}

/// Result type for HITL coordinator operations.
pub type HitlResult<T> = Result<T, HitlError>;
