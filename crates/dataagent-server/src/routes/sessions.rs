//! Session & message endpoints (§6 "Session & message endpoints").

use axum::Json;
use axum::extract::{Path, Query, State};
use chrono::{DateTime, Utc};
use dataagent_core::SessionId;
use serde::{Deserialize, Serialize};

use crate::auth::AuthenticatedUser;
use crate::error::ApiError;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct SessionSummary {
    session_id: SessionId,
    user_id: String,
    assistant_id: String,
    created_at: DateTime<Utc>,
    last_active: DateTime<Utc>,
}

impl From<dataagent_core::Session> for SessionSummary {
    fn from(session: dataagent_core::Session) -> Self {
        Self {
            session_id: session.session_id,
            user_id: session.user_id.as_str().to_string(),
            assistant_id: session.assistant_id.as_str().to_string(),
            created_at: session.created_at,
            last_active: session.last_active,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ListSessionsResponse {
    sessions: Vec<SessionSummary>,
    total: usize,
}

/// `list_sessions(user_id)`.
pub async fn list_sessions(
    State(state): State<AppState>,
    auth: AuthenticatedUser,
) -> Result<Json<ListSessionsResponse>, ApiError> {
    let sessions = state.sessions.list_by_user(&auth.user_id).await?;
    let sessions: Vec<SessionSummary> = sessions.into_iter().map(SessionSummary::from).collect();
    let total = sessions.len();
    Ok(Json(ListSessionsResponse { sessions, total }))
}

async fn owned_session(
    state: &AppState,
    auth: &AuthenticatedUser,
    session_id: SessionId,
) -> Result<dataagent_core::Session, ApiError> {
    let session = state
        .sessions
        .get_session(session_id)
        .await?
        .filter(|session| session.user_id == auth.user_id)
        .ok_or_else(|| ApiError::session_not_found(session_id))?;
    Ok(session)
}

/// `get_session(id)`.
pub async fn get_session(
    State(state): State<AppState>,
    auth: AuthenticatedUser,
    Path(session_id): Path<SessionId>,
) -> Result<Json<SessionSummary>, ApiError> {
    let session = owned_session(&state, &auth, session_id).await?;
    Ok(Json(SessionSummary::from(session)))
}

/// `delete_session(id)`.
pub async fn delete_session(
    State(state): State<AppState>,
    auth: AuthenticatedUser,
    Path(session_id): Path<SessionId>,
) -> Result<axum::http::StatusCode, ApiError> {
    owned_session(&state, &auth, session_id).await?;
    state.connections.disconnect(&session_id).await;
    state.messages.delete_messages(session_id).await?;
    state.sessions.delete_session(session_id).await?;
    Ok(axum::http::StatusCode::NO_CONTENT)
}

#[derive(Debug, Deserialize)]
pub struct MessagesQuery {
    #[serde(default = "default_limit")]
    limit: usize,
    #[serde(default)]
    offset: usize,
}

fn default_limit() -> usize {
    50
}

#[derive(Debug, Serialize)]
pub struct MessagesResponse {
    messages: Vec<dataagent_core::Message>,
    total: usize,
    limit: usize,
    offset: usize,
}

/// `get_session_messages(id, limit, offset)`.
pub async fn get_session_messages(
    State(state): State<AppState>,
    auth: AuthenticatedUser,
    Path(session_id): Path<SessionId>,
    Query(query): Query<MessagesQuery>,
) -> Result<Json<MessagesResponse>, ApiError> {
    owned_session(&state, &auth, session_id).await?;
    let messages = state.messages.get_messages(session_id, query.limit, query.offset).await?;
    let total = state.messages.count_messages(session_id).await?;
    Ok(Json(MessagesResponse {
        messages,
        total,
        limit: query.limit,
        offset: query.offset,
    }))
}

#[derive(Debug, Serialize)]
pub struct CancelResponse {
    status: &'static str,
    session_id: SessionId,
}

/// `cancel_chat(session_id)`.
pub async fn cancel_chat(
    State(state): State<AppState>,
    auth: AuthenticatedUser,
    Path(session_id): Path<SessionId>,
) -> Result<Json<CancelResponse>, ApiError> {
    owned_session(&state, &auth, session_id).await?;
    let cancelled = state.dispatcher.cancel_turn(&session_id).await;
    if cancelled {
        Ok(Json(CancelResponse {
            status: "cancelled",
            session_id,
        }))
    } else {
        Err(ApiError::session_not_found(session_id).with_details(serde_json::json!({
            "reason": "no active task",
        })))
    }
}
