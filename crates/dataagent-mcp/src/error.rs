//! MCP pool error types.

use thiserror::Error;

/// Errors from the MCP connection pool (C6).
#[derive(Debug, Error)]
pub enum McpError {
    /// Establishing a connection would breach a per-user or pool-total cap.
    #[error("MCP connection capacity exceeded")]
    CapacityExceeded,

    /// The named server is not connected for this user.
    #[error("server {server:?} not connected for this user")]
    ServerNotConnected {
        /// The server name.
        server: String,
    },

    /// Dialing the server process/endpoint failed.
    #[error("failed to connect to server {server:?}: {reason}")]
    ConnectFailed {
        /// The server name.
        server: String,
        /// The underlying failure.
        reason: String,
    },

    /// A tool call to a connected server failed.
    #[error("tool call {tool:?} on server {server:?} failed: {reason}")]
    ToolCallFailed {
        /// The server name.
        server: String,
        /// The tool name.
        tool: String,
        /// The underlying failure.
        reason: String,
    },
}

/// Result type for MCP pool operations.
pub type McpResult<T> = Result<T, McpError>;
