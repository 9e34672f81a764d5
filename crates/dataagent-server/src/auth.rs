//! Authentication extractor (§6 "Authentication (surface only)").
//!
//! Token/key *validation* is explicitly out of scope — spec.md treats
//! authentication primitives as black boxes. This extractor only decides,
//! per `server.auth_mode`, which headers must be present and resolves the
//! tenant's `user_id`; it never inspects bearer-token contents beyond
//! non-emptiness.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use dataagent_core::UserId;

use crate::error::ApiError;
use crate::state::AppState;

/// The authenticated tenant for a request.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    pub user_id: UserId,
}

impl FromRequestParts<AppState> for AuthenticatedUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let server = &state.config.server;

        match server.auth_mode.as_str() {
            "bearer" => {
                let header = parts
                    .headers
                    .get(axum::http::header::AUTHORIZATION)
                    .and_then(|value| value.to_str().ok())
                    .unwrap_or_default();
                let token = header.strip_prefix("Bearer ").unwrap_or_default().trim();
                if token.is_empty() {
                    return Err(ApiError::unauthorized("missing or empty bearer token"));
                }
            },
            "api_key" => {
                let provided = parts
                    .headers
                    .get("x-api-key")
                    .and_then(|value| value.to_str().ok())
                    .unwrap_or_default();
                let expected = server.api_key.as_deref().unwrap_or_default();
                if provided.is_empty() || provided != expected {
                    return Err(ApiError::unauthorized("missing or invalid API key"));
                }
            },
            _ => {},
        }

        let user_id = parts
            .headers
            .get(server.dev_user_header.as_str())
            .and_then(|value| value.to_str().ok())
            .filter(|value| !value.is_empty())
            .ok_or_else(|| ApiError::unauthorized(format!("missing {} header", server.dev_user_header)))?;

        Ok(Self {
            user_id: UserId::from(user_id.to_string()),
        })
    }
}
