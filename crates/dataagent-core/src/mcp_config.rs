//! MCP server configuration data type (C5's data model, §3).

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::ids::UserId;

/// How a client reaches an MCP server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Transport {
    /// Spawn a child process and speak MCP over its stdio.
    Stdio,
    /// Connect to an HTTP endpoint using server-sent events.
    Sse,
}

/// A single user's configuration for one MCP server.
///
/// Uniqueness is `(user_id, name)`; a read scoped to one `user_id` must
/// never return another user's rows (§8, "MCP isolation").
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct McpServerConfig {
    /// Owning user.
    pub user_id: UserId,
    /// Server name, unique per user.
    pub name: String,
    /// Command to spawn (stdio transport).
    pub command: String,
    /// Arguments to the command.
    #[serde(default)]
    pub args: Vec<String>,
    /// Environment variables for the spawned process.
    #[serde(default)]
    pub env: HashMap<String, String>,
    /// Endpoint URL (SSE transport).
    pub url: Option<String>,
    /// Transport kind.
    pub transport: Transport,
    /// Extra headers (SSE transport).
    #[serde(default)]
    pub headers: HashMap<String, String>,
    /// Whether this server is disabled (the pool skips it on `connect`).
    #[serde(default)]
    pub disabled: bool,
    /// Tool names pre-approved for this server, bypassing HITL.
    #[serde(default)]
    pub auto_approve: Vec<String>,
}

impl McpServerConfig {
    /// Build a stdio-transport server config with everything else defaulted.
    #[must_use]
    pub fn stdio(user_id: UserId, name: impl Into<String>, command: impl Into<String>) -> Self {
        Self {
            user_id,
            name: name.into(),
            command: command.into(),
            args: Vec::new(),
            env: HashMap::new(),
            url: None,
            transport: Transport::Stdio,
            headers: HashMap::new(),
            disabled: false,
            auto_approve: Vec::new(),
        }
    }
}

/// A user's full set of MCP server configurations.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserMcpConfig {
    /// The configured servers, keyed by name.
    pub servers: HashMap<String, McpServerConfig>,
}
