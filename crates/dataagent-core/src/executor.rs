//! The `AgentExecutor` boundary.
//!
//! The LLM/tool-execution engine itself is out of scope for this
//! repository (spec.md §1): it is consumed only through this trait. Real
//! implementations live outside this workspace; `dataagent-dispatch`'s test
//! suite exercises the streaming dispatcher against hand-written fakes.

use async_trait::async_trait;
use serde_json::Value;

use crate::decision::Decision;
use crate::event::EventKind;
use crate::ids::{AssistantId, SessionId, UserId};

/// Everything the dispatcher assembles before instantiating an executor for
/// one turn: user-scoped tools, the composed system prompt, and workspace
/// context (C11 step 2).
#[derive(Debug, Clone)]
pub struct AgentConfig {
    /// The session's owning user.
    pub user_id: UserId,
    /// The assistant this turn is bound to.
    pub assistant_id: AssistantId,
    /// The session this turn belongs to.
    pub session_id: SessionId,
    /// Absolute path to the session's workspace, if any.
    pub workspace_path: Option<String>,
    /// Tool definitions available to the executor this turn (from the MCP
    /// pool, C6).
    pub tools: Vec<Value>,
    /// The fully composed system prompt (rule-engine section + memory +
    /// base prompt, from C7/C8).
    pub system_prompt: String,
}

/// One user turn's input.
#[derive(Debug, Clone)]
pub struct TurnInput {
    /// The user's message text.
    pub message: String,
    /// Opaque caller-supplied context, merged into the prompt by the executor.
    pub user_context: Option<Value>,
}

/// Why an executor run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnOutcome {
    /// The turn completed normally.
    Completed,
    /// The turn was cancelled (`cancel()` was called).
    Cancelled,
}

/// A running agent turn, pulled one event at a time.
///
/// The dispatcher polls [`next_event`](AgentExecutor::next_event) in a loop;
/// when it observes an [`EventKind::HitlRequest`], it suspends pulling,
/// resolves the decision through the HITL handler (C9), and feeds the
/// result back via [`submit_decision`](AgentExecutor::submit_decision)
/// before resuming the poll loop.
#[async_trait]
pub trait AgentExecutor: Send {
    /// Advance the executor and return its next event, or `None` once the
    /// turn has produced its terminal `done` event and has nothing more to
    /// yield.
    async fn next_event(&mut self) -> Option<EventKind>;

    /// Deliver a HITL decision for a previously yielded `hitl_request`,
    /// identified by `interrupt_id`. Implementations that do not support
    /// suspension may ignore this; the reference fakes use it to unblock an
    /// internally queued continuation.
    async fn submit_decision(&mut self, interrupt_id: &str, decision: Decision);

    /// Cooperatively cancel the turn. Must cause the next
    /// [`next_event`](AgentExecutor::next_event) to return the terminal
    /// `done{cancelled:true}` event (or `None` if it has already been
    /// emitted) within the cancellation promptness bound (§5, 1s).
    async fn cancel(&mut self);
}
