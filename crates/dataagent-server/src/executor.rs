//! The injection point for the out-of-scope LLM/tool-execution engine
//! (spec.md §1: `AgentExecutor` is consumed as an opaque black box).
//!
//! [`EchoExecutor`] is a placeholder implementation, in the same spirit as
//! `dataagent-dispatch`'s `ScriptedExecutor` and `dataagent-hitl`'s
//! `AutoApproveHandler` test doubles: it exists so the server has *some*
//! concrete executor to run turns against, not as a real agent. A
//! production deployment replaces [`ExecutorFactory`] with one that talks to
//! an actual model.

use async_trait::async_trait;
use dataagent_core::decision::Decision;
use dataagent_core::event::EventKind;
use dataagent_core::executor::{AgentConfig, AgentExecutor, TurnInput};

/// Builds an [`AgentExecutor`] for one turn.
///
/// Injected into [`crate::state::AppState`] so the HTTP/WebSocket routes
/// never depend on a concrete executor implementation.
pub trait ExecutorFactory: Send + Sync {
    /// Build a fresh executor bound to `config`, ready to run `input`.
    fn build(&self, config: AgentConfig, input: TurnInput) -> Box<dyn AgentExecutor>;
}

/// An executor that immediately echoes the user's message back as the
/// assistant's reply and terminates. Never issues tool calls or HITL
/// requests.
pub struct EchoExecutor {
    pending: Option<EventKind>,
    done: bool,
}

impl EchoExecutor {
    fn new(input: &TurnInput) -> Self {
        Self {
            pending: Some(EventKind::Text {
                content: format!("echo: {}", input.message),
                is_final: true,
            }),
            done: false,
        }
    }
}

#[async_trait]
impl AgentExecutor for EchoExecutor {
    async fn next_event(&mut self) -> Option<EventKind> {
        if let Some(event) = self.pending.take() {
            return Some(event);
        }
        if self.done {
            return None;
        }
        self.done = true;
        Some(EventKind::Done {
            token_usage: None,
            cancelled: false,
        })
    }

    async fn submit_decision(&mut self, _interrupt_id: &str, _decision: Decision) {}

    async fn cancel(&mut self) {
        self.pending = None;
        self.done = true;
    }
}

/// Builds [`EchoExecutor`]s. The default [`ExecutorFactory`] until a real
/// agent engine is wired in.
#[derive(Debug, Default, Clone, Copy)]
pub struct EchoExecutorFactory;

impl ExecutorFactory for EchoExecutorFactory {
    fn build(&self, _config: AgentConfig, input: TurnInput) -> Box<dyn AgentExecutor> {
        Box::new(EchoExecutor::new(&input))
    }
}
