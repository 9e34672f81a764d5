//! One-shot chat (§6 "One-shot chat").

use axum::Json;
use axum::extract::State;
use dataagent_core::ids::SessionId;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::auth::AuthenticatedUser;
use crate::error::ApiError;
use crate::state::AppState;
use crate::turn;

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    message: String,
    session_id: Option<SessionId>,
    assistant_id: Option<String>,
    user_context: Option<Value>,
}

#[derive(Debug, Serialize)]
pub struct ChatResponse {
    session_id: SessionId,
    /// Each entry is an [`dataagent_core::event::Event::to_dict`] map, the
    /// same shape the streaming transport's `data` field carries.
    events: Vec<Value>,
}

/// `POST /chat`: run one turn to completion and return every event it
/// produced.
pub async fn chat(
    State(state): State<AppState>,
    auth: AuthenticatedUser,
    Json(request): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, ApiError> {
    let (session, config, input) = turn::prepare_turn(
        &state,
        &auth.user_id,
        request.session_id,
        request.assistant_id,
        &request.message,
        request.user_context,
    )
    .await?;

    let executor = state.executor_factory.build(config, input.clone());

    let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel::<String>();
    state.connections.connect(session.session_id, tx).await;

    state
        .dispatcher
        .run_turn(session.session_id, &input.message, executor)
        .await?;

    state.connections.disconnect(&session.session_id).await;

    let mut events = Vec::new();
    while let Ok(frame) = rx.try_recv() {
        if let Ok(envelope) = serde_json::from_str::<Value>(&frame) {
            if let Some(data) = envelope.get("data") {
                events.push(data.clone());
            }
        }
    }

    Ok(Json(ChatResponse {
        session_id: session.session_id,
        events,
    }))
}
