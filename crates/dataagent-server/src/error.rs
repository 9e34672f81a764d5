//! The `{error_code, message, details?}` error envelope (§6 "Error
//! envelope", §7) and the `IntoResponse` mapping every domain error enum
//! funnels through.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use serde_json::Value;

/// A semantic error code from §6/§7.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    /// The requested session does not exist (or has expired).
    SessionNotFound,
    /// A dependency (storage, MCP pool) is unavailable.
    ServiceUnavailable,
    /// A connection or pool capacity cap was breached.
    CapacityExceeded,
    /// The caller's credentials were missing or invalid.
    Unauthorized,
    /// An unexpected internal failure.
    InternalError,
    /// A streaming frame carried an unrecognized `type` discriminator.
    UnknownEventType,
}

impl ErrorCode {
    /// The wire string for this code.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::SessionNotFound => "SESSION_NOT_FOUND",
            Self::ServiceUnavailable => "SERVICE_UNAVAILABLE",
            Self::CapacityExceeded => "CAPACITY_EXCEEDED",
            Self::Unauthorized => "UNAUTHORIZED",
            Self::InternalError => "INTERNAL_ERROR",
            Self::UnknownEventType => "UNKNOWN_EVENT_TYPE",
        }
    }

    fn status(self) -> StatusCode {
        match self {
            Self::SessionNotFound => StatusCode::NOT_FOUND,
            Self::ServiceUnavailable => StatusCode::SERVICE_UNAVAILABLE,
            Self::CapacityExceeded => StatusCode::SERVICE_UNAVAILABLE,
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::InternalError => StatusCode::INTERNAL_SERVER_ERROR,
            Self::UnknownEventType => StatusCode::BAD_REQUEST,
        }
    }
}

#[derive(Debug, Serialize)]
struct ErrorEnvelope {
    error_code: &'static str,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<Value>,
}

/// The API-facing error type every handler returns on failure.
///
/// Deliberately flat (not an enum per upstream error type): every domain
/// crate's error converts into one of the six codes via `From` impls below,
/// matching §7's error table.
#[derive(Debug)]
pub struct ApiError {
    code: ErrorCode,
    message: String,
    details: Option<Value>,
}

impl ApiError {
    /// Build an error with an explicit code and message.
    #[must_use]
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            details: None,
        }
    }

    /// Attach structured details to the envelope.
    #[must_use]
    pub fn with_details(mut self, details: Value) -> Self {
        self.details = Some(details);
        self
    }

    /// `SESSION_NOT_FOUND` 404.
    #[must_use]
    pub fn session_not_found(session_id: impl std::fmt::Display) -> Self {
        Self::new(ErrorCode::SessionNotFound, format!("session {session_id} not found"))
    }

    /// `UNAUTHORIZED` 401.
    #[must_use]
    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Unauthorized, message)
    }

    /// `UNKNOWN_EVENT_TYPE` 400, for a streaming frame with an unrecognized
    /// `type` discriminator.
    #[must_use]
    pub fn unknown_event_type(kind: impl std::fmt::Display) -> Self {
        Self::new(ErrorCode::UnknownEventType, format!("unknown frame type: {kind}"))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.code.status();
        let body = ErrorEnvelope {
            error_code: self.code.as_str(),
            message: self.message,
            details: self.details,
        };
        (status, Json(body)).into_response()
    }
}

impl From<dataagent_storage::StorageError> for ApiError {
    fn from(err: dataagent_storage::StorageError) -> Self {
        match err {
            dataagent_storage::StorageError::NotFound(what) => {
                Self::new(ErrorCode::SessionNotFound, what)
            },
            other => Self::new(ErrorCode::InternalError, other.to_string()),
        }
    }
}

impl From<dataagent_session::SessionError> for ApiError {
    fn from(err: dataagent_session::SessionError) -> Self {
        match err {
            dataagent_session::SessionError::CapacityExceeded => {
                Self::new(ErrorCode::CapacityExceeded, err.to_string())
            },
            dataagent_session::SessionError::Storage(e) => e.into(),
        }
    }
}

impl From<dataagent_dispatch::DispatchError> for ApiError {
    fn from(err: dataagent_dispatch::DispatchError) -> Self {
        match err {
            dataagent_dispatch::DispatchError::NoChannel => {
                Self::new(ErrorCode::ServiceUnavailable, err.to_string())
            },
            dataagent_dispatch::DispatchError::Storage(e) => e.into(),
        }
    }
}

impl From<dataagent_mcp::McpError> for ApiError {
    fn from(err: dataagent_mcp::McpError) -> Self {
        match err {
            dataagent_mcp::McpError::CapacityExceeded => {
                Self::new(ErrorCode::CapacityExceeded, err.to_string())
            },
            other => Self::new(ErrorCode::InternalError, other.to_string()),
        }
    }
}
