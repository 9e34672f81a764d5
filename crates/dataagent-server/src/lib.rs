//! dataagent-server — the axum-based HTTP/WebSocket surface for dataagent
//! (§6).
//!
//! Wires every domain crate (`dataagent-storage`, `dataagent-mcp`,
//! `dataagent-hitl`, `dataagent-rules`, `dataagent-session`,
//! `dataagent-dispatch`) behind a thin router. The LLM/tool-execution
//! engine itself is out of scope (spec.md §1); [`executor::ExecutorFactory`]
//! is the seam a real one plugs into.

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]

/// Authentication extractor (§6 "Authentication (surface only)").
pub mod auth;
/// Builds [`state::AppState`] from a loaded configuration.
pub mod bootstrap;
/// The injection point for the out-of-scope agent executor.
pub mod executor;
/// The `{error_code, message, details?}` error envelope.
pub mod error;
/// X-Request-ID correlation middleware.
pub mod request_id;
/// Route handlers.
pub mod routes;
/// Shared application state.
pub mod state;
/// Shared turn-setup logic between the one-shot and streaming routes.
pub mod turn;

use axum::Router;
use axum::routing::{delete, get, post};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::state::AppState;

/// Build the full application router over `state`.
#[must_use]
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(routes::health::health))
        .route("/chat", post(routes::chat::chat))
        .route("/ws/{session_id}", get(routes::ws::ws_handler))
        .route("/sessions", get(routes::sessions::list_sessions))
        .route("/sessions/{session_id}", get(routes::sessions::get_session))
        .route("/sessions/{session_id}", delete(routes::sessions::delete_session))
        .route("/sessions/{session_id}/messages", get(routes::sessions::get_session_messages))
        .route("/sessions/{session_id}/cancel", post(routes::sessions::cancel_chat))
        .layer(axum::middleware::from_fn(request_id::request_id_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
