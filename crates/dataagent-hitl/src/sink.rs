//! The channel the HITL handler emits `hitl_request` events on.
//!
//! Kept as a trait (rather than a direct dependency on the connection
//! manager) so the coordinator can be exercised in tests without a real
//! session registry, mirroring the teacher's `ApprovalHandler` seam.

use async_trait::async_trait;
use dataagent_core::{Event, SessionId};

/// Delivers events to a live session channel. Implemented by the
/// connection manager (C10).
#[async_trait]
pub trait EventSink: Send + Sync {
    /// Send `event` to `session_id`'s channel. Returns `false` if the
    /// session has no live channel (already disconnected).
    async fn send_event(&self, session_id: &SessionId, event: Event) -> bool;
}
