//! Streaming chat over WebSocket (§6 "Streaming chat (client↔server)").
//!
//! Client frames are `{type, payload}` with `type ∈ {chat, hitl_decision,
//! cancel, ping}`; server frames are `{event_type, data, timestamp}`
//! mirroring `dataagent_core::Event`, plus a `stream_end` terminator once a
//! turn finishes.

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Path, State};
use axum::response::Response;
use dataagent_core::decision::Decision;
use dataagent_core::ids::SessionId;
use futures::{SinkExt, StreamExt};
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::{info, warn};

use crate::auth::AuthenticatedUser;
use crate::state::AppState;
use crate::turn;

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ClientFrame {
    Chat {
        payload: ChatPayload,
    },
    HitlDecision {
        payload: HitlDecisionPayload,
    },
    Cancel,
    Ping,
}

#[derive(Debug, Deserialize)]
struct ChatPayload {
    message: String,
    assistant_id: Option<String>,
    user_context: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct HitlDecisionPayload {
    decision: Decision,
}

/// `GET /ws/{session_id}`: upgrade to a WebSocket and drive one session's
/// streaming chat.
pub async fn ws_handler(
    State(state): State<AppState>,
    auth: AuthenticatedUser,
    Path(session_id): Path<SessionId>,
    ws: WebSocketUpgrade,
) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, state, auth, session_id))
}

async fn handle_socket(socket: WebSocket, state: AppState, auth: AuthenticatedUser, session_id: SessionId) {
    let (mut sender, mut receiver) = socket.split();
    let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel::<String>();

    if !state.connections.connect(session_id, tx).await {
        let _ = sender
            .send(Message::Text(
                json!({"error_code": "CAPACITY_EXCEEDED", "message": "connection slot unavailable"}).to_string(),
            ))
            .await;
        return;
    }

    let forward = tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            if sender.send(Message::Text(msg)).await.is_err() {
                break;
            }
        }
    });

    while let Some(Ok(msg)) = receiver.next().await {
        let Message::Text(text) = msg else { continue };
        match serde_json::from_str::<ClientFrame>(&text) {
            Ok(ClientFrame::Chat { payload }) => {
                handle_chat(&state, &auth, session_id, payload).await;
            },
            Ok(ClientFrame::HitlDecision { payload }) => {
                if let Err(err) = state.hitl.resolve_decision(&session_id, payload.decision).await {
                    warn!(%session_id, %err, "hitl decision could not be resolved");
                }
            },
            Ok(ClientFrame::Cancel) => {
                state.dispatcher.cancel_turn(&session_id).await;
            },
            Ok(ClientFrame::Ping) => {},
            Err(err) => {
                warn!(%session_id, %err, "unrecognized streaming frame");
                state
                    .connections
                    .send(
                        &session_id,
                        json!({
                            "error_code": "UNKNOWN_EVENT_TYPE",
                            "message": format!("unknown frame type: {err}"),
                        })
                        .to_string(),
                    )
                    .await;
            },
        }
    }

    state.connections.disconnect(&session_id).await;
    forward.abort();
}

async fn handle_chat(state: &AppState, auth: &AuthenticatedUser, session_id: SessionId, payload: ChatPayload) {
    let prepared = turn::prepare_turn(
        state,
        &auth.user_id,
        Some(session_id),
        payload.assistant_id,
        &payload.message,
        payload.user_context,
    )
    .await;

    let (_session, config, input) = match prepared {
        Ok(prepared) => prepared,
        Err(err) => {
            warn!(%session_id, ?err, "failed to prepare turn");
            return;
        },
    };

    let executor = state.executor_factory.build(config, input.clone());
    let dispatcher = state.dispatcher.clone();
    let connections_for_task = state.connections.clone();
    let connections_inner = state.connections.clone();
    let message = input.message;

    connections_for_task
        .start_task(session_id, async move {
            if let Err(err) = dispatcher.run_turn(session_id, &message, executor).await {
                warn!(%session_id, %err, "turn failed");
            }
            connections_inner
                .send(&session_id, json!({"event_type": "stream_end"}).to_string())
                .await;
        })
        .await;

    info!(%session_id, "turn dispatched");
}
