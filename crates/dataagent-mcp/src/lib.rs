//! dataagent-mcp — the per-user MCP connection pool (C6).
//!
//! Wraps the official `rmcp` SDK behind [`McpDialer`], a small trait that
//! lets [`McpPool`]'s capacity/isolation/rollback logic be exercised
//! against a fake dialer in tests without spawning real child processes.
//!
//! One mutex guards the pool's connection map and counters; dialing a
//! server is never done while holding it (§5).

#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]

pub mod dialer;
pub mod error;
pub mod pool;
pub mod tool;

pub use dialer::{McpConnectionHandle, McpDialer, RmcpDialer};
pub use error::{McpError, McpResult};
pub use pool::{McpPool, PoolLimits};
pub use tool::{ToolDefinition, ToolResult};
