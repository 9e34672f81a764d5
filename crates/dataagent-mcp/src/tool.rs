//! Tool shapes surfaced by a connected server, independent of transport.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A tool definition, scoped to the server that exposes it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDefinition {
    /// The owning server's name.
    pub server: String,
    /// Tool name, unique within the server.
    pub name: String,
    /// Human-readable description.
    pub description: Option<String>,
    /// JSON Schema for the tool's arguments.
    pub input_schema: Value,
}

/// The outcome of a tool call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolResult {
    /// The call's return payload.
    pub content: Value,
    /// Whether the server reported an error.
    pub is_error: bool,
}

impl ToolResult {
    /// Render the result as plain text, for cases (prompt assembly,
    /// logging) that need a string rather than structured content.
    #[must_use]
    pub fn text_content(&self) -> String {
        match &self.content {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        }
    }
}
