//! Connection manager (§4.9 C10).
//!
//! Grounded in the teacher's gateway session-registry pattern (one mutex
//! guarding `conns`/`tasks`/`total`, a per-session channel, a cancellable
//! per-session task) generalized to this spec's simpler shape. Decision
//! slots (the spec's `pending` map) are not duplicated here — they live in
//! [`dataagent_hitl::HitlCoordinator`], which this manager implements
//! [`EventSink`] for and delegates to on disconnect.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use dataagent_core::event::Event;
use dataagent_core::ids::SessionId;
use dataagent_hitl::{EventSink, HitlCoordinator};
use serde_json::json;
use tokio::sync::{Mutex, mpsc};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// Outbound channel for one session: a framed-JSON text sender.
///
/// Mirrors a WebSocket/SSE sink without coupling this crate to any
/// particular transport; `dataagent-server` wires the real sender.
pub type Channel = mpsc::UnboundedSender<String>;

struct ConnState {
    conns: HashMap<SessionId, Channel>,
    tasks: HashMap<SessionId, JoinHandle<()>>,
    total: usize,
}

impl Default for ConnState {
    fn default() -> Self {
        Self {
            conns: HashMap::new(),
            tasks: HashMap::new(),
            total: 0,
        }
    }
}

/// Multiplexes live session channels and their in-flight turn tasks under
/// one mutex, per §5's concurrency discipline.
pub struct ConnectionManager {
    state: Mutex<ConnState>,
    max_total: usize,
    hitl: Arc<HitlCoordinator>,
}

impl ConnectionManager {
    /// Construct a manager with a hard cap on concurrent channels.
    #[must_use]
    pub fn new(max_total: usize, hitl: Arc<HitlCoordinator>) -> Self {
        Self {
            state: Mutex::new(ConnState::default()),
            max_total,
            hitl,
        }
    }

    /// Accept a new channel for `session_id`. Returns `false` (capacity
    /// rejection) without storing anything if `total >= max_total`.
    pub async fn connect(&self, session_id: SessionId, channel: Channel) -> bool {
        let mut state = self.state.lock().await;
        if state.total >= self.max_total {
            warn!(%session_id, "connection rejected: capacity exceeded");
            return false;
        }
        state.conns.insert(session_id, channel);
        state.total += 1;
        true
    }

    /// Tear down everything associated with `session_id`: remove the
    /// channel, cancel any pending HITL slot (resolved as a rejection),
    /// cancel any active task, and decrement `total`.
    ///
    /// A no-op (not an error) if the session isn't connected.
    pub async fn disconnect(&self, session_id: &SessionId) {
        let mut state = self.state.lock().await;
        let had_conn = state.conns.remove(session_id).is_some();
        if let Some(task) = state.tasks.remove(session_id) {
            task.abort();
        }
        if had_conn {
            state.total = state.total.saturating_sub(1);
        }
        drop(state);

        if self.hitl.has_pending(session_id).await {
            self.hitl.reject_for_disconnect(session_id).await;
        }
    }

    /// Serialize and deliver a raw text message to `session_id`'s channel.
    ///
    /// On a write error (channel closed) this disconnects the session and
    /// returns `false`. Returns `false` for an unknown session too.
    pub async fn send(&self, session_id: &SessionId, msg: String) -> bool {
        let sender = {
            let state = self.state.lock().await;
            state.conns.get(session_id).cloned()
        };
        let Some(sender) = sender else {
            return false;
        };
        if sender.send(msg).is_ok() {
            true
        } else {
            self.disconnect(session_id).await;
            false
        }
    }

    /// Wrap `event` as `{event_type, data, timestamp}` and deliver it.
    pub async fn send_event(&self, session_id: &SessionId, event: &Event) -> bool {
        let dict = event.to_dict();
        let envelope = json!({
            "event_type": event.event_type(),
            "data": dict,
            "timestamp": event.timestamp,
        });
        self.send(session_id, envelope.to_string()).await
    }

    /// Install a new task for `session_id`, atomically cancelling any
    /// existing one first.
    pub async fn start_task<F>(&self, session_id: SessionId, fut: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let handle = tokio::spawn(fut);
        let mut state = self.state.lock().await;
        if let Some(previous) = state.tasks.insert(session_id, handle) {
            previous.abort();
        }
    }

    /// Cancel `session_id`'s active task, if any and not already finished.
    /// Returns `true` if a task was cancelled.
    pub async fn cancel_task(&self, session_id: &SessionId) -> bool {
        let mut state = self.state.lock().await;
        match state.tasks.remove(session_id) {
            Some(task) if !task.is_finished() => {
                task.abort();
                true
            },
            Some(_) => false,
            None => false,
        }
    }

    /// Whether `session_id` currently has a connected channel.
    pub async fn is_connected(&self, session_id: &SessionId) -> bool {
        self.state.lock().await.conns.contains_key(session_id)
    }

    /// Current channel count.
    pub async fn total(&self) -> usize {
        self.state.lock().await.total
    }
}

/// Connects the connection manager to [`HitlCoordinator`] as the transport
/// it emits `hitl_request` events through.
#[async_trait]
impl EventSink for ConnectionManager {
    async fn send_event(&self, session_id: &SessionId, event: Event) -> bool {
        debug!(%session_id, event_type = event.event_type(), "delivering event");
        ConnectionManager::send_event(self, session_id, &event).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dataagent_core::decision::Decision;
    use dataagent_core::event::{Event, EventKind};
    use std::time::Duration;

    fn manager(max_total: usize) -> ConnectionManager {
        ConnectionManager::new(max_total, Arc::new(HitlCoordinator::new(Duration::from_millis(50))))
    }

    #[tokio::test]
    async fn connect_accepts_until_capacity() {
        let mgr = manager(1);
        let (tx1, _rx1) = mpsc::unbounded_channel();
        let (tx2, _rx2) = mpsc::unbounded_channel();
        assert!(mgr.connect(SessionId::new(), tx1).await);
        assert!(!mgr.connect(SessionId::new(), tx2).await);
    }

    #[tokio::test]
    async fn disconnect_is_a_noop_for_unknown_session() {
        let mgr = manager(10);
        mgr.disconnect(&SessionId::new()).await;
        assert_eq!(mgr.total().await, 0);
    }

    #[tokio::test]
    async fn disconnect_frees_capacity() {
        let mgr = manager(1);
        let sid = SessionId::new();
        let (tx, _rx) = mpsc::unbounded_channel();
        assert!(mgr.connect(sid, tx).await);
        mgr.disconnect(&sid).await;
        assert_eq!(mgr.total().await, 0);
        let (tx2, _rx2) = mpsc::unbounded_channel();
        assert!(mgr.connect(SessionId::new(), tx2).await);
    }

    #[tokio::test]
    async fn send_to_unknown_session_returns_false() {
        let mgr = manager(10);
        assert!(!mgr.send(&SessionId::new(), "hi".to_string()).await);
    }

    #[tokio::test]
    async fn send_error_triggers_disconnect() {
        let mgr = manager(10);
        let sid = SessionId::new();
        let (tx, rx) = mpsc::unbounded_channel();
        mgr.connect(sid, tx).await;
        drop(rx);
        assert!(!mgr.send(&sid, "hi".to_string()).await);
        assert!(!mgr.is_connected(&sid).await);
    }

    #[tokio::test]
    async fn start_task_cancels_the_previous_one() {
        let mgr = manager(10);
        let sid = SessionId::new();
        let (done_tx, mut done_rx) = mpsc::unbounded_channel::<()>();
        mgr.start_task(sid, async {
            tokio::time::sleep(Duration::from_secs(60)).await;
        })
        .await;
        mgr.start_task(sid, async move {
            let _ = done_tx.send(());
        })
        .await;
        tokio::time::timeout(Duration::from_millis(200), done_rx.recv())
            .await
            .expect("second task should complete")
            .expect("channel open");
    }

    #[tokio::test]
    async fn cancel_task_reports_whether_one_existed() {
        let mgr = manager(10);
        let sid = SessionId::new();
        assert!(!mgr.cancel_task(&sid).await);
        mgr.start_task(sid, async {
            tokio::time::sleep(Duration::from_secs(60)).await;
        })
        .await;
        assert!(mgr.cancel_task(&sid).await);
    }

    #[tokio::test]
    async fn disconnect_resolves_a_pending_hitl_slot_as_rejection() {
        let hitl = Arc::new(HitlCoordinator::new(Duration::from_secs(10)));
        let mgr = Arc::new(ConnectionManager::new(10, hitl.clone()));
        let sid = SessionId::new();
        let (tx, _rx) = mpsc::unbounded_channel();
        mgr.connect(sid, tx).await;

        let waiter = {
            let hitl = hitl.clone();
            let mgr = mgr.clone();
            tokio::spawn(async move { hitl.request_approval(mgr.as_ref(), sid, "i1".to_string(), vec![], 0).await })
        };
        // give request_approval time to install its slot
        tokio::time::sleep(Duration::from_millis(20)).await;
        mgr.disconnect(&sid).await;
        let decision = tokio::time::timeout(Duration::from_secs(1), waiter)
            .await
            .expect("waiter should resolve")
            .expect("join ok");
        assert!(!decision.is_approved());
    }

    #[allow(dead_code)]
    fn _silence_unused(_: Decision, _: Event, _: EventKind) {}
}
