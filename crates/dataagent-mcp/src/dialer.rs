//! The boundary between the pool and an actual MCP transport.
//!
//! [`McpDialer`] is injected into [`crate::pool::McpPool`] so the pool's
//! capacity/isolation logic can be exercised against a fake in tests
//! without spawning real child processes, matching the
//! `ApprovalHandler`-as-injected-trait pattern used for the HITL handler.

use std::borrow::Cow;
use std::sync::Arc;

use async_trait::async_trait;
use dataagent_core::{McpServerConfig, Transport};
use rmcp::ServiceExt;
use rmcp::model::CallToolRequestParams;
use rmcp::transport::TokioChildProcess;
use serde_json::Value;
use tokio::process::Command;

use crate::error::{McpError, McpResult};
use crate::tool::{ToolDefinition, ToolResult};

/// A live handle to one connected MCP server.
#[async_trait]
pub trait McpConnectionHandle: Send + Sync {
    /// List the tools this server exposes.
    async fn list_tools(&self) -> McpResult<Vec<ToolDefinition>>;

    /// Invoke one of this server's tools.
    async fn call_tool(&self, tool: &str, args: Value) -> McpResult<ToolResult>;

    /// Tear the connection down. Best-effort; errors are logged by the
    /// caller, never propagated (disconnects must always succeed from the
    /// pool's point of view).
    async fn close(&self);
}

/// Establishes [`McpConnectionHandle`]s for a [`McpServerConfig`].
#[async_trait]
pub trait McpDialer: Send + Sync {
    /// Dial the server described by `config`.
    async fn dial(&self, config: &McpServerConfig) -> McpResult<Arc<dyn McpConnectionHandle>>;
}

/// Production dialer backed by the official `rmcp` SDK.
#[derive(Debug, Default)]
pub struct RmcpDialer;

struct RmcpConnection {
    server: String,
    peer: rmcp::service::RunningService<rmcp::RoleClient, ()>,
}

#[async_trait]
impl McpConnectionHandle for RmcpConnection {
    async fn list_tools(&self) -> McpResult<Vec<ToolDefinition>> {
        let tools = self
            .peer
            .list_all_tools()
            .await
            .map_err(|e| McpError::ToolCallFailed {
                server: self.server.clone(),
                tool: "list_tools".to_string(),
                reason: e.to_string(),
            })?;
        Ok(tools
            .into_iter()
            .map(|t| ToolDefinition {
                server: self.server.clone(),
                name: t.name.to_string(),
                description: t.description.map(|d| d.to_string()),
                input_schema: serde_json::to_value(&*t.input_schema).unwrap_or(Value::Null),
            })
            .collect())
    }

    async fn call_tool(&self, tool: &str, args: Value) -> McpResult<ToolResult> {
        let arguments = match args {
            Value::Object(map) => Some(map),
            Value::Null => None,
            other => {
                let mut map = serde_json::Map::new();
                map.insert("value".to_string(), other);
                Some(map)
            },
        };
        let params = CallToolRequestParams {
            meta: None,
            name: Cow::Owned(tool.to_string()),
            arguments,
            task: None,
        };
        let result = self
            .peer
            .call_tool(params)
            .await
            .map_err(|e| McpError::ToolCallFailed {
                server: self.server.clone(),
                tool: tool.to_string(),
                reason: e.to_string(),
            })?;
        Ok(ToolResult {
            content: serde_json::to_value(&result.content).unwrap_or(Value::Null),
            is_error: result.is_error.unwrap_or(false),
        })
    }

    async fn close(&self) {
        let _ = self.peer.clone().cancel().await;
    }
}

#[async_trait]
impl McpDialer for RmcpDialer {
    async fn dial(&self, config: &McpServerConfig) -> McpResult<Arc<dyn McpConnectionHandle>> {
        match config.transport {
            Transport::Stdio => {
                let mut command = Command::new(&config.command);
                command.args(&config.args);
                for (key, value) in &config.env {
                    command.env(key, value);
                }
                let transport = TokioChildProcess::new(command).map_err(|e| {
                    McpError::ConnectFailed {
                        server: config.name.clone(),
                        reason: e.to_string(),
                    }
                })?;
                let peer = ().serve(transport).await.map_err(|e| McpError::ConnectFailed {
                    server: config.name.clone(),
                    reason: e.to_string(),
                })?;
                Ok(Arc::new(RmcpConnection {
                    server: config.name.clone(),
                    peer,
                }))
            },
            Transport::Sse => {
                // TODO: wire up once the workspace enables rmcp's SSE
                // client transport feature (only transport-child-process
                // and transport-io are enabled today).
                Err(McpError::ConnectFailed {
                    server: config.name.clone(),
                    reason: "sse transport not enabled in this build".to_string(),
                })
            },
        }
    }
}
