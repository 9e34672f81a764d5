//! The HITL handler (C9): a per-session, single-slot approval rendezvous.
//!
//! Adapted from the teacher's [`crate::manager`] (`ApprovalManager`), which
//! dispatches to a pluggable [`ApprovalHandler`](crate::manager::ApprovalHandler)
//! and defers on timeout/unavailability. This component is simpler by
//! design (§4.8): there is no allowance store and no deferred queue — a
//! tool call either gets a decision within `T_hitl`, or it is rejected.

use std::collections::HashMap;
use std::time::Duration;

use dataagent_core::{ActionRequest, Decision, Event, EventKind, SessionId};
use tokio::sync::{Mutex, oneshot};
use tracing::{info, warn};

use crate::error::{HitlError, HitlResult};
use crate::sink::EventSink;

/// Default HITL timeout (§5: `T_hitl`, 300s).
pub const DEFAULT_HITL_TIMEOUT: Duration = Duration::from_secs(300);

/// Coordinates human-in-the-loop approval round-trips.
///
/// Holds at most one pending [`oneshot::Sender`] per session. Installing a
/// new slot for a session that already has one drops (displaces) the old
/// sender without sending through it — the original waiter observes its
/// receiver close and synthesizes its own rejection (§9, Open Questions:
/// displacement is a cancel, not a reject, to avoid delivering a spurious
/// decision to an unrelated caller).
pub struct HitlCoordinator {
    slots: Mutex<HashMap<SessionId, oneshot::Sender<Decision>>>,
    timeout: Duration,
}

impl HitlCoordinator {
    /// Build a coordinator with the given approval timeout.
    #[must_use]
    pub fn new(timeout: Duration) -> Self {
        Self {
            slots: Mutex::new(HashMap::new()),
            timeout,
        }
    }

    /// Request approval for `action_requests` on behalf of `session_id`,
    /// emitting a `hitl_request` event through `sink` and waiting (bounded
    /// by the configured timeout) for a decision.
    ///
    /// Always returns a [`Decision`] — never an error. Timeout, channel
    /// disconnect, and displacement all resolve to a rejection per §4.8.
    pub async fn request_approval(
        &self,
        sink: &dyn EventSink,
        session_id: SessionId,
        interrupt_id: String,
        action_requests: Vec<ActionRequest>,
        now_ms: i64,
    ) -> Decision {
        let (tx, rx) = oneshot::channel();
        {
            let mut slots = self.slots.lock().await;
            if slots.remove(&session_id).is_some() {
                info!(%session_id, "displacing prior HITL slot");
            }
            slots.insert(session_id.clone(), tx);
        }

        let event = Event::new(
            EventKind::HitlRequest {
                interrupt_id,
                action_requests,
            },
            now_ms,
        );
        if !sink.send_event(&session_id, event).await {
            warn!(%session_id, "hitl_request emitted to a session with no live channel");
        }

        let decision = match tokio::time::timeout(self.timeout, rx).await {
            Ok(Ok(decision)) => decision,
            Ok(Err(_recv_dropped)) => {
                Decision::reject("HITL slot displaced before a decision arrived")
            },
            Err(_elapsed) => Decision::timeout_rejection(),
        };

        self.slots.lock().await.remove(&session_id);
        decision
    }

    /// Deliver a client decision for `session_id`'s pending slot.
    ///
    /// # Errors
    /// Returns [`HitlError::NoPendingSlot`] if there is no outstanding
    /// request for this session (already resolved, timed out, or none was
    /// ever made).
    pub async fn resolve_decision(
        &self,
        session_id: &SessionId,
        decision: Decision,
    ) -> HitlResult<()> {
        let mut slots = self.slots.lock().await;
        let tx = slots.remove(session_id).ok_or(HitlError::NoPendingSlot)?;
        // The receiver may have already timed out and dropped; that's not
        // an error for the caller delivering the decision.
        let _ = tx.send(decision);
        Ok(())
    }

    /// Resolve `session_id`'s pending slot (if any) as a rejection. Called
    /// by the connection manager's disconnect path (§4.9c): a disconnect
    /// before a decision is delivered must resolve the slot as a rejection,
    /// not merely cancel it.
    pub async fn reject_for_disconnect(&self, session_id: &SessionId) {
        if let Some(tx) = self.slots.lock().await.remove(session_id) {
            let _ = tx.send(Decision::reject("session disconnected before a decision arrived"));
        }
    }

    /// Whether `session_id` currently has a pending slot.
    pub async fn has_pending(&self, session_id: &SessionId) -> bool {
        self.slots.lock().await.contains_key(session_id)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use serde_json::json;
    use tokio::sync::Mutex as TokioMutex;

    use super::*;

    #[derive(Default)]
    struct RecordingSink {
        events: TokioMutex<Vec<(SessionId, Event)>>,
        deliver: AtomicUsize,
    }

    #[async_trait]
    impl EventSink for RecordingSink {
        async fn send_event(&self, session_id: &SessionId, event: Event) -> bool {
            self.deliver.fetch_add(1, Ordering::SeqCst);
            self.events.lock().await.push((session_id.clone(), event));
            true
        }
    }

    fn action() -> Vec<ActionRequest> {
        vec![ActionRequest {
            tool_name: "delete_file".to_string(),
            args: json!({"path": "/tmp/x"}),
        }]
    }

    #[tokio::test]
    async fn resolve_decision_unblocks_request_approval() {
        let coordinator = Arc::new(HitlCoordinator::new(Duration::from_secs(5)));
        let sink = Arc::new(RecordingSink::default());
        let session_id = SessionId::new();

        let waiter = {
            let coordinator = coordinator.clone();
            let sink = sink.clone();
            let session_id = session_id.clone();
            tokio::spawn(async move {
                coordinator
                    .request_approval(&*sink, session_id, "int-1".to_string(), action(), 0)
                    .await
            })
        };

        // Give the waiter a tick to install its slot.
        tokio::task::yield_now().await;
        tokio::time::sleep(Duration::from_millis(10)).await;

        coordinator
            .resolve_decision(&session_id, Decision::Approve { message: None })
            .await
            .unwrap();

        let decision = waiter.await.unwrap();
        assert!(decision.is_approved());
        assert_eq!(sink.deliver.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn timeout_resolves_to_deterministic_rejection() {
        let coordinator = HitlCoordinator::new(Duration::from_millis(20));
        let sink = RecordingSink::default();
        let session_id = SessionId::new();

        let decision = coordinator
            .request_approval(&sink, session_id, "int-1".to_string(), action(), 0)
            .await;

        assert!(!decision.is_approved());
        match decision {
            Decision::Reject { message } => {
                assert_eq!(message.as_deref(), Some(Decision::TIMEOUT_MESSAGE));
            },
            Decision::Approve { .. } => panic!("expected rejection"),
        }
    }

    #[tokio::test]
    async fn slot_is_removed_after_resolution() {
        let coordinator = Arc::new(HitlCoordinator::new(Duration::from_secs(5)));
        let sink = Arc::new(RecordingSink::default());
        let session_id = SessionId::new();

        let waiter = {
            let coordinator = coordinator.clone();
            let sink = sink.clone();
            let session_id = session_id.clone();
            tokio::spawn(async move {
                coordinator
                    .request_approval(&*sink, session_id, "int-1".to_string(), action(), 0)
                    .await
            })
        };
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert!(coordinator.has_pending(&session_id).await);

        coordinator
            .resolve_decision(&session_id, Decision::Approve { message: None })
            .await
            .unwrap();
        waiter.await.unwrap();

        assert!(!coordinator.has_pending(&session_id).await);
    }

    #[tokio::test]
    async fn resolve_with_no_pending_slot_is_an_error() {
        let coordinator = HitlCoordinator::new(Duration::from_secs(5));
        let result = coordinator
            .resolve_decision(&SessionId::new(), Decision::Approve { message: None })
            .await;
        assert_eq!(result, Err(HitlError::NoPendingSlot));
    }

    #[tokio::test]
    async fn displacing_a_slot_cancels_the_original_waiter_as_a_rejection() {
        let coordinator = Arc::new(HitlCoordinator::new(Duration::from_secs(5)));
        let sink = Arc::new(RecordingSink::default());
        let session_id = SessionId::new();

        let first = {
            let coordinator = coordinator.clone();
            let sink = sink.clone();
            let session_id = session_id.clone();
            tokio::spawn(async move {
                coordinator
                    .request_approval(&*sink, session_id, "first".to_string(), action(), 0)
                    .await
            })
        };
        tokio::time::sleep(Duration::from_millis(10)).await;

        // A second request for the same session displaces the first slot.
        let second = coordinator
            .request_approval(&sink, session_id.clone(), "second".to_string(), action(), 1)
            .await;

        let first_decision = first.await.unwrap();
        assert!(!first_decision.is_approved());
        assert!(!second.is_approved());
    }

    #[tokio::test]
    async fn disconnect_resolves_pending_slot_as_rejection() {
        let coordinator = Arc::new(HitlCoordinator::new(Duration::from_secs(5)));
        let sink = Arc::new(RecordingSink::default());
        let session_id = SessionId::new();

        let waiter = {
            let coordinator = coordinator.clone();
            let sink = sink.clone();
            let session_id = session_id.clone();
            tokio::spawn(async move {
                coordinator
                    .request_approval(&*sink, session_id, "int-1".to_string(), action(), 0)
                    .await
            })
        };
        tokio::time::sleep(Duration::from_millis(10)).await;

        coordinator.reject_for_disconnect(&session_id).await;

        let decision = waiter.await.unwrap();
        assert!(!decision.is_approved());
    }
}
