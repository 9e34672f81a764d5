//! Configuration struct definitions for every dataagent component.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// The fully-merged, deserialized configuration tree.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// HTTP/WebSocket server settings (§6).
    #[serde(default)]
    pub server: ServerSection,
    /// Session manager settings (C13).
    #[serde(default)]
    pub session: SessionSection,
    /// MCP connection pool settings (C6).
    #[serde(default)]
    pub mcp: McpSection,
    /// HITL handler settings (C9).
    #[serde(default)]
    pub hitl: HitlSection,
    /// Connection manager settings (C10).
    #[serde(default)]
    pub connection: ConnectionSection,
    /// Storage backend selection (C2–C5, C12).
    #[serde(default)]
    pub storage: StorageSection,
    /// Rule engine settings (C7).
    #[serde(default)]
    pub rules: RulesSection,
    /// Logging settings, consumed by `dataagent-telemetry`.
    #[serde(default)]
    pub logging: LoggingSection,
}

/// HTTP/WebSocket bind settings and authentication mode (§6 "Authentication").
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSection {
    /// Address to bind the HTTP listener to.
    pub bind_addr: String,
    /// Port to bind the HTTP listener to.
    pub port: u16,
    /// `"bearer"`, `"api_key"`, or `"disabled"` (dev mode — the caller is
    /// identified by `dev_user_header` instead).
    pub auth_mode: String,
    /// Static API key accepted when `auth_mode = "api_key"`.
    pub api_key: Option<String>,
    /// Header read for the caller's user id when `auth_mode = "disabled"`.
    pub dev_user_header: String,
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1".to_string(),
            port: 8080,
            auth_mode: "disabled".to_string(),
            api_key: None,
            dev_user_header: "X-User-Id".to_string(),
        }
    }
}

/// Session lifetime settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionSection {
    /// Idle timeout before a session is eligible for cleanup, in seconds.
    pub timeout_secs: u64,
    /// Interval between cleanup sweeps, in seconds.
    pub cleanup_interval_secs: u64,
}

impl Default for SessionSection {
    fn default() -> Self {
        Self {
            timeout_secs: 3600,
            cleanup_interval_secs: 300,
        }
    }
}

/// MCP connection pool caps (§4.5).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct McpSection {
    /// Maximum simultaneous connections for a single user.
    pub max_connections_per_user: usize,
    /// Maximum simultaneous connections across all users.
    pub max_connections_total: usize,
    /// Timeout for establishing one connection, in seconds.
    pub connect_timeout_secs: u64,
}

impl Default for McpSection {
    fn default() -> Self {
        Self {
            max_connections_per_user: 10,
            max_connections_total: 200,
            connect_timeout_secs: 30,
        }
    }
}

/// HITL handler timeout (§4.8, `T_hitl`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HitlSection {
    /// Approval wait timeout, in seconds. Spec default is 300s.
    pub timeout_secs: u64,
}

impl Default for HitlSection {
    fn default() -> Self {
        Self { timeout_secs: 300 }
    }
}

/// Connection manager capacity (§4.9).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConnectionSection {
    /// Maximum simultaneous live session channels.
    pub max_total: usize,
}

impl Default for ConnectionSection {
    fn default() -> Self {
        Self { max_total: 10_000 }
    }
}

/// Which storage backend to construct at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackendKind {
    /// In-memory reference stores (tests, local dev).
    Memory,
    /// `SurrealDB`-backed stores.
    Surreal,
}

impl Default for StorageBackendKind {
    fn default() -> Self {
        Self::Memory
    }
}

/// Storage backend selection and connection string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageSection {
    /// Which backend to construct.
    pub backend: StorageBackendKind,
    /// `SurrealDB` connection string (e.g. `surrealkv:///var/lib/dataagent/db`,
    /// `mem://`). Ignored when `backend` is `memory`.
    pub connection_string: String,
    /// `SurrealDB` namespace.
    pub namespace: String,
    /// `SurrealDB` database name.
    pub database: String,
}

impl Default for StorageSection {
    fn default() -> Self {
        Self {
            backend: StorageBackendKind::Memory,
            connection_string: "mem://".to_string(),
            namespace: "dataagent".to_string(),
            database: "dataagent".to_string(),
        }
    }
}

/// Rule-file search paths for the rule engine (C7) and memory loader (C8).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RulesSection {
    /// Directories scanned for rule files, highest-priority first.
    pub search_paths: Vec<String>,
    /// Per-user memory-file paths relative to the user's memory directory.
    pub memory_files: Vec<String>,
    /// Size bound (bytes of rule content) the merge pass stops appending at
    /// (§4.6, "Size bound").
    pub max_content_size: usize,
    /// Root directory the memory loader resolves per-user/assistant memory
    /// paths under (§4.7).
    pub data_root: String,
    /// Application name used in the project-level memory path
    /// `<project_root>/.<app>/agent.md` (§4.7).
    pub app_name: String,
}

impl Default for RulesSection {
    fn default() -> Self {
        Self {
            search_paths: vec![".dataagent/rules".to_string()],
            memory_files: vec!["memory.md".to_string()],
            max_content_size: 32_768,
            data_root: "./data".to_string(),
            app_name: "dataagent".to_string(),
        }
    }
}

/// Logging level/format, consumed to build a `dataagent_telemetry::LogConfig`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSection {
    /// Base log level (`"trace"`, `"debug"`, `"info"`, `"warn"`, `"error"`).
    pub level: String,
    /// Output format: `"pretty"`, `"compact"`, or `"json"`.
    pub format: String,
    /// Per-module directives layered on top of `level`.
    pub directives: Vec<String>,
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
            directives: Vec::new(),
        }
    }
}

/// Maps `DATAAGENT_`-prefixed environment variables to the dotted config
/// field path they fall back into when the field is otherwise unset.
pub(crate) fn env_var_field_map() -> HashMap<&'static str, &'static str> {
    HashMap::from([
        ("DATAAGENT_SERVER_BIND_ADDR", "server.bind_addr"),
        ("DATAAGENT_SERVER_PORT", "server.port"),
        ("DATAAGENT_SESSION_TIMEOUT_SECS", "session.timeout_secs"),
        ("DATAAGENT_MCP_MAX_CONNECTIONS_TOTAL", "mcp.max_connections_total"),
        ("DATAAGENT_HITL_TIMEOUT_SECS", "hitl.timeout_secs"),
        ("DATAAGENT_STORAGE_BACKEND", "storage.backend"),
        ("DATAAGENT_STORAGE_CONNECTION_STRING", "storage.connection_string"),
        ("DATAAGENT_LOG_LEVEL", "logging.level"),
    ])
}
