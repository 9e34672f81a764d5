//! Streaming dispatcher (§4.10 C11).
//!
//! Owns the per-turn event loop: pull events from an [`AgentExecutor`],
//! forward them to the client through the connection manager, persist
//! user/assistant terminal messages, and route `hitl_request` events
//! through the HITL coordinator rather than the generic send path.
//!
//! Cancellation is cooperative: each in-flight turn registers a
//! [`CancellationToken`] with the dispatcher (a *second*, finer-grained
//! tracking table than the connection manager's raw task handles) so that
//! `cancel_turn` can ask the executor to unwind cleanly via
//! [`AgentExecutor::cancel`] instead of aborting the task outright. The
//! connection manager's `cancel_task`/`disconnect` abort remains the
//! best-effort backstop for a turn that doesn't respond to cooperative
//! cancellation in time (§5).

use std::collections::HashMap;
use std::sync::Arc;

use dataagent_core::decision::Decision;
use dataagent_core::event::{Event, EventKind};
use dataagent_core::executor::AgentExecutor;
use dataagent_core::ids::SessionId;
use dataagent_core::message::Role;
use dataagent_hitl::HitlCoordinator;
use dataagent_session::ConnectionManager;
use dataagent_storage::traits::MessageStore;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::error::DispatchResult;

/// Runs turns for many sessions, coordinating the connection manager,
/// message store, and HITL handler.
pub struct Dispatcher {
    connections: Arc<ConnectionManager>,
    hitl: Arc<HitlCoordinator>,
    messages: Arc<dyn MessageStore>,
    cancel_tokens: Mutex<HashMap<SessionId, CancellationToken>>,
}

impl Dispatcher {
    /// Build a dispatcher over the given connection manager, HITL
    /// coordinator, and message store.
    #[must_use]
    pub fn new(connections: Arc<ConnectionManager>, hitl: Arc<HitlCoordinator>, messages: Arc<dyn MessageStore>) -> Self {
        Self {
            connections,
            hitl,
            messages,
            cancel_tokens: Mutex::new(HashMap::new()),
        }
    }

    /// Request cooperative cancellation of `session_id`'s in-flight turn,
    /// if any. Returns `true` if a turn was found and signalled.
    pub async fn cancel_turn(&self, session_id: &SessionId) -> bool {
        if let Some(token) = self.cancel_tokens.lock().await.get(session_id) {
            token.cancel();
            true
        } else {
            false
        }
    }

    /// Run one turn to completion: persist the user's message, pull events
    /// from `executor`, forward them to the client, persist the terminal
    /// assistant message, and route `hitl_request` suspension through the
    /// HITL coordinator (§4.10 steps 3–7).
    ///
    /// # Errors
    /// Returns [`crate::error::DispatchError`] if message persistence fails.
    /// A closed client channel is not an error — the loop simply stops
    /// forwarding and finishes draining the executor so it can still
    /// unwind and release tool handles.
    pub async fn run_turn(
        &self,
        session_id: SessionId,
        user_message: &str,
        mut executor: Box<dyn AgentExecutor>,
    ) -> DispatchResult<()> {
        self.messages
            .save_message(session_id.clone(), Role::User, user_message.to_string(), None)
            .await?;

        let token = CancellationToken::new();
        self.cancel_tokens.lock().await.insert(session_id.clone(), token.clone());

        let mut assistant_text = String::new();
        let mut now_ms = 0i64;

        enum Selected {
            Cancelled,
            Event(Option<EventKind>),
        }

        loop {
            // The cancellation arm and the event arm both end up needing a
            // `&mut executor` call; keeping their bodies out of the select!
            // arms (and matching afterwards instead) avoids asking the
            // borrow checker to prove the unselected future already let go
            // of its borrow before the handler runs.
            let selected = tokio::select! {
                biased;
                () = token.cancelled() => Selected::Cancelled,
                event = executor.next_event() => Selected::Event(event),
            };

            let kind = match selected {
                Selected::Cancelled => {
                    info!(%session_id, "turn cancellation requested, asking executor to unwind");
                    executor.cancel().await;
                    continue;
                },
                Selected::Event(None) => break,
                Selected::Event(Some(kind)) => kind,
            };
            now_ms += 1;

            match &kind {
                EventKind::HitlRequest {
                    interrupt_id,
                    action_requests,
                } => {
                    let decision = self
                        .hitl
                        .request_approval(
                            self.connections.as_ref(),
                            session_id.clone(),
                            interrupt_id.clone(),
                            action_requests.clone(),
                            now_ms,
                        )
                        .await;
                    let approved = matches!(decision, Decision::Approve { .. });
                    executor.submit_decision(interrupt_id, decision).await;
                    info!(%session_id, %interrupt_id, approved, "hitl decision delivered to executor");
                },
                EventKind::Text { content, is_final } => {
                    self.connections
                        .send_event(&session_id, &Event::new(kind.clone(), now_ms))
                        .await;
                    assistant_text.push_str(content);
                    if *is_final && !assistant_text.is_empty() {
                        self.messages
                            .save_message(session_id.clone(), Role::Assistant, assistant_text.clone(), None)
                            .await?;
                    }
                },
                _ => {
                    self.connections
                        .send_event(&session_id, &Event::new(kind.clone(), now_ms))
                        .await;
                },
            }

            if matches!(kind, EventKind::Done { .. }) {
                break;
            }
        }

        self.cancel_tokens.lock().await.remove(&session_id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use dataagent_core::decision::Decision as CoreDecision;
    use dataagent_storage::MemoryMessageStore;
    use std::sync::Mutex as StdMutex;
    use std::time::Duration;
    use tokio::sync::mpsc;

    struct ScriptedExecutor {
        events: StdMutex<Vec<EventKind>>,
        decisions_seen: Arc<StdMutex<Vec<(String, CoreDecision)>>>,
    }

    #[async_trait]
    impl AgentExecutor for ScriptedExecutor {
        async fn next_event(&mut self) -> Option<EventKind> {
            let popped = self.events.lock().unwrap().pop();
            match popped {
                Some(event) => Some(event),
                // Nothing queued: behave like a still-running executor and
                // hang until `cancel()` pushes a terminal event.
                None => std::future::pending::<Option<EventKind>>().await,
            }
        }

        async fn submit_decision(&mut self, interrupt_id: &str, decision: CoreDecision) {
            self.decisions_seen
                .lock()
                .unwrap()
                .push((interrupt_id.to_string(), decision));
        }

        async fn cancel(&mut self) {
            self.events.lock().unwrap().clear();
            self.events.lock().unwrap().push(EventKind::Done {
                token_usage: None,
                cancelled: true,
            });
        }
    }

    fn scripted(mut events: Vec<EventKind>) -> ScriptedExecutor {
        events.reverse(); // next_event pops from the back, so reverse to preserve order
        ScriptedExecutor {
            events: StdMutex::new(events),
            decisions_seen: Arc::new(StdMutex::new(Vec::new())),
        }
    }

    async fn dispatcher() -> (Arc<Dispatcher>, mpsc::UnboundedReceiver<String>, SessionId) {
        let hitl = Arc::new(HitlCoordinator::new(Duration::from_millis(50)));
        let connections = Arc::new(ConnectionManager::new(10, hitl.clone()));
        let messages = Arc::new(MemoryMessageStore::new());
        let dispatcher = Arc::new(Dispatcher::new(connections.clone(), hitl, messages));
        let session_id = SessionId::new();
        let (tx, rx) = mpsc::unbounded_channel();
        connections.connect(session_id, tx).await;
        (dispatcher, rx, session_id)
    }

    #[tokio::test]
    async fn completed_turn_persists_user_and_assistant_messages() {
        let (dispatcher, mut rx, session_id) = dispatcher().await;

        let executor = scripted(vec![
            EventKind::Text {
                content: "hello".to_string(),
                is_final: true,
            },
            EventKind::Done {
                token_usage: None,
                cancelled: false,
            },
        ]);

        dispatcher
            .run_turn(session_id.clone(), "hi", Box::new(executor))
            .await
            .unwrap();

        let mut seen = Vec::new();
        while let Ok(msg) = rx.try_recv() {
            seen.push(msg);
        }
        assert_eq!(seen.len(), 2); // text + done
    }

    #[tokio::test]
    async fn hitl_request_is_routed_through_the_coordinator_not_the_plain_send_path() {
        let (dispatcher, mut rx, session_id) = dispatcher().await;

        let executor = scripted(vec![
            EventKind::HitlRequest {
                interrupt_id: "int-1".to_string(),
                action_requests: vec![],
            },
            EventKind::Done {
                token_usage: None,
                cancelled: false,
            },
        ]);
        let decisions = executor.decisions_seen.clone();

        dispatcher
            .run_turn(session_id.clone(), "do the risky thing", Box::new(executor))
            .await
            .unwrap();

        let mut seen = Vec::new();
        while let Ok(msg) = rx.try_recv() {
            seen.push(msg);
        }
        // hitl_request event (via coordinator) + done event
        assert_eq!(seen.len(), 2);
        assert!(seen[0].contains("hitl_request"));

        // nobody answered, so the coordinator's timeout synthesizes a
        // rejection and the executor receives it via `submit_decision`
        let recorded = decisions.lock().unwrap();
        assert_eq!(recorded.len(), 1);
        assert_eq!(recorded[0].0, "int-1");
        assert!(!recorded[0].1.is_approved());
    }

    #[tokio::test]
    async fn cancel_turn_asks_the_executor_to_unwind() {
        let (dispatcher, mut _rx, session_id) = dispatcher().await;

        let executor = scripted(vec![]); // never yields on its own; waits on the cancel branch

        let run = {
            let dispatcher = dispatcher.clone();
            let session_id = session_id.clone();
            tokio::spawn(async move {
                dispatcher
                    .run_turn(session_id, "long task", Box::new(executor))
                    .await
            })
        };

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(dispatcher.cancel_turn(&session_id).await);

        tokio::time::timeout(Duration::from_secs(1), run)
            .await
            .expect("turn should finish after cancellation")
            .unwrap()
            .unwrap();
    }
}
