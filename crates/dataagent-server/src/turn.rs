//! Shared turn-setup logic used by both the one-shot and streaming chat
//! routes: resolve/create a session, compose the system prompt from the
//! rule engine and memory loader, and build the [`AgentConfig`] an
//! executor runs against.

use dataagent_core::executor::{AgentConfig, TurnInput};
use dataagent_core::ids::{AssistantId, SessionId, UserId};
use dataagent_core::session::Session;
use dataagent_rules::{MatchContext, MemoryState};
use serde_json::Value;

use crate::error::ApiError;
use crate::state::AppState;

const DEFAULT_ASSISTANT_ID: &str = "default";
const DEFAULT_SYSTEM_PROMPT: &str = "You are a helpful assistant.";

/// Resolve (or create) the session this turn runs against, and build the
/// `AgentConfig` the executor consumes.
///
/// # Errors
/// Propagates session-store failures.
pub async fn prepare_turn(
    state: &AppState,
    user_id: &UserId,
    session_id: Option<SessionId>,
    assistant_id: Option<String>,
    message: &str,
    user_context: Option<Value>,
) -> Result<(Session, AgentConfig, TurnInput), ApiError> {
    let assistant_id = AssistantId::new(assistant_id.unwrap_or_else(|| DEFAULT_ASSISTANT_ID.to_string()));

    let session = state
        .sessions
        .get_or_create_session(user_id.clone(), assistant_id.clone(), session_id)
        .await?;

    let match_ctx = MatchContext {
        files: Vec::new(),
        query: message.to_string(),
        manual_refs: std::collections::HashSet::new(),
    };
    let engine_output = state.rule_engine.evaluate(&match_ctx);

    let mut memory_state = MemoryState::default();
    state
        .memory_loader
        .load_if_needed(&mut memory_state, user_id.as_str(), assistant_id.as_str(), None);
    let system_prompt = state.memory_loader.compose_system_prompt(
        &memory_state,
        &format!("{DEFAULT_SYSTEM_PROMPT}\n\n{}", engine_output.prompt_section),
        user_id.as_str(),
        assistant_id.as_str(),
        None,
    );

    let tools: Vec<Value> = state
        .mcp_pool
        .get_tools(user_id)
        .await
        .unwrap_or_default()
        .into_iter()
        .filter_map(|tool| serde_json::to_value(tool).ok())
        .collect();

    let config = AgentConfig {
        user_id: user_id.clone(),
        assistant_id,
        session_id: session.session_id,
        workspace_path: None,
        tools,
        system_prompt,
    };
    let input = TurnInput {
        message: message.to_string(),
        user_context,
    };

    Ok((session, config, input))
}
