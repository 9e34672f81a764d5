//! The MCP connection pool (C6).
//!
//! One mutex guards `connections` and the counters. Establishing a
//! connection is a potentially slow network/process dial, so the mutex is
//! released across the dial and re-acquired only to commit (or discard) the
//! result — see spec §5.

use std::collections::HashMap;
use std::sync::Arc;

use dataagent_core::{McpServerConfig, UserId};
use serde_json::Value;
use tokio::sync::Mutex;
use tracing::{info, warn};

use crate::dialer::{McpConnectionHandle, McpDialer};
use crate::error::{McpError, McpResult};
use crate::tool::{ToolDefinition, ToolResult};

struct Connection {
    config: McpServerConfig,
    handle: Arc<dyn McpConnectionHandle>,
}

#[derive(Default)]
struct PoolState {
    connections: HashMap<UserId, HashMap<String, Connection>>,
    total_connections: usize,
}

/// Per-user and pool-wide connection caps.
#[derive(Debug, Clone, Copy)]
pub struct PoolLimits {
    /// Maximum simultaneous connections for a single user.
    pub max_per_user: usize,
    /// Maximum simultaneous connections across all users.
    pub max_total: usize,
}

impl Default for PoolLimits {
    fn default() -> Self {
        Self {
            max_per_user: 10,
            max_total: 200,
        }
    }
}

/// The MCP connection pool. Cheap to clone; state lives behind an `Arc`.
pub struct McpPool {
    state: Arc<Mutex<PoolState>>,
    dialer: Arc<dyn McpDialer>,
    limits: PoolLimits,
}

impl McpPool {
    /// Build a pool against the given dialer and limits.
    #[must_use]
    pub fn new(dialer: Arc<dyn McpDialer>, limits: PoolLimits) -> Self {
        Self {
            state: Arc::new(Mutex::new(PoolState::default())),
            dialer,
            limits,
        }
    }

    /// Connect every enabled server in `configs` for `user_id`.
    ///
    /// Servers already connected for this user are left untouched and are
    /// not recounted against the cap. If any enabled server fails to
    /// connect, every connection newly opened by *this call* is closed
    /// again before the error is returned — a partial success never
    /// leaks into pool state.
    pub async fn connect(&self, user_id: &UserId, configs: &[McpServerConfig]) -> McpResult<()> {
        let mut opened: Vec<(String, Connection)> = Vec::new();

        for config in configs.iter().filter(|c| !c.disabled) {
            {
                let state = self.state.lock().await;
                if state
                    .connections
                    .get(user_id)
                    .is_some_and(|servers| servers.contains_key(&config.name))
                {
                    continue;
                }
                let per_user = state.connections.get(user_id).map_or(0, HashMap::len) + opened.len();
                if per_user >= self.limits.max_per_user
                    || state.total_connections + opened.len() >= self.limits.max_total
                {
                    Self::rollback(opened).await;
                    return Err(McpError::CapacityExceeded);
                }
            }

            match self.dialer.dial(config).await {
                Ok(handle) => opened.push((
                    config.name.clone(),
                    Connection {
                        config: config.clone(),
                        handle,
                    },
                )),
                Err(err) => {
                    warn!(server = %config.name, error = %err, "mcp connect failed, rolling back partial batch");
                    Self::rollback(opened).await;
                    return Err(err);
                },
            }
        }

        let mut state = self.state.lock().await;
        let user_servers = state.connections.entry(user_id.clone()).or_default();
        for (name, conn) in opened {
            if user_servers.insert(name, conn).is_none() {
                state.total_connections += 1;
            }
        }
        info!(%user_id, "mcp servers connected");
        Ok(())
    }

    async fn rollback(opened: Vec<(String, Connection)>) {
        for (_, conn) in opened {
            conn.handle.close().await;
        }
    }

    /// List the tools exposed by every server connected for `user_id`.
    pub async fn get_tools(&self, user_id: &UserId) -> McpResult<Vec<ToolDefinition>> {
        let handles: Vec<Arc<dyn McpConnectionHandle>> = {
            let state = self.state.lock().await;
            state
                .connections
                .get(user_id)
                .map(|servers| servers.values().map(|c| c.handle.clone()).collect())
                .unwrap_or_default()
        };
        let mut tools = Vec::new();
        for handle in handles {
            tools.extend(handle.list_tools().await?);
        }
        Ok(tools)
    }

    /// Invoke `tool` on `server` for `user_id`.
    pub async fn call_tool(
        &self,
        user_id: &UserId,
        server: &str,
        tool: &str,
        args: Value,
    ) -> McpResult<ToolResult> {
        let handle = {
            let state = self.state.lock().await;
            state
                .connections
                .get(user_id)
                .and_then(|servers| servers.get(server))
                .map(|c| c.handle.clone())
                .ok_or_else(|| McpError::ServerNotConnected {
                    server: server.to_string(),
                })?
        };
        handle.call_tool(tool, args).await
    }

    /// Probe every connection for `user_id`, dropping any that no longer
    /// answer. Returns the set of server names that were removed.
    pub async fn health_check(&self, user_id: &UserId) -> Vec<String> {
        let handles: Vec<(String, Arc<dyn McpConnectionHandle>)> = {
            let state = self.state.lock().await;
            state
                .connections
                .get(user_id)
                .map(|servers| {
                    servers
                        .iter()
                        .map(|(name, c)| (name.clone(), c.handle.clone()))
                        .collect()
                })
                .unwrap_or_default()
        };

        let mut dead = Vec::new();
        for (name, handle) in handles {
            if handle.list_tools().await.is_err() {
                dead.push(name);
            }
        }

        if !dead.is_empty() {
            let mut state = self.state.lock().await;
            if let Some(servers) = state.connections.get_mut(user_id) {
                for name in &dead {
                    if servers.remove(name).is_some() {
                        state.total_connections = state.total_connections.saturating_sub(1);
                    }
                }
            }
        }
        dead
    }

    /// Disconnect one server (or every server, when `server_name` is
    /// `None`) for `user_id`.
    pub async fn disconnect(&self, user_id: &UserId, server_name: Option<&str>) {
        let removed: Vec<Connection> = {
            let mut state = self.state.lock().await;
            let Some(servers) = state.connections.get_mut(user_id) else {
                return;
            };
            let removed = match server_name {
                Some(name) => servers.remove(name).into_iter().collect::<Vec<_>>(),
                None => std::mem::take(servers).into_values().collect(),
            };
            state.total_connections = state.total_connections.saturating_sub(removed.len());
            if servers.is_empty() {
                state.connections.remove(user_id);
            }
            removed
        };
        for conn in removed {
            conn.handle.close().await;
        }
    }

    /// Disconnect every connection for every user. Used on shutdown.
    pub async fn disconnect_all(&self) {
        let all: Vec<Connection> = {
            let mut state = self.state.lock().await;
            state.total_connections = 0;
            std::mem::take(&mut state.connections)
                .into_values()
                .flat_map(HashMap::into_values)
                .collect()
        };
        for conn in all {
            conn.handle.close().await;
        }
    }

    /// The server configs currently connected for `user_id`, for
    /// diagnostics and tests.
    pub async fn connected_servers(&self, user_id: &UserId) -> Vec<McpServerConfig> {
        let state = self.state.lock().await;
        state
            .connections
            .get(user_id)
            .map(|servers| servers.values().map(|c| c.config.clone()).collect())
            .unwrap_or_default()
    }

    /// Total connections currently held across all users.
    pub async fn total_connections(&self) -> usize {
        self.state.lock().await.total_connections
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use dataagent_core::McpServerConfig;

    use super::*;

    struct FakeHandle {
        server: String,
        fail_tools: bool,
    }

    #[async_trait]
    impl McpConnectionHandle for FakeHandle {
        async fn list_tools(&self) -> McpResult<Vec<ToolDefinition>> {
            if self.fail_tools {
                return Err(McpError::ServerNotConnected {
                    server: self.server.clone(),
                });
            }
            Ok(vec![ToolDefinition {
                server: self.server.clone(),
                name: "echo".to_string(),
                description: None,
                input_schema: Value::Null,
            }])
        }

        async fn call_tool(&self, _tool: &str, args: Value) -> McpResult<ToolResult> {
            Ok(ToolResult {
                content: args,
                is_error: false,
            })
        }

        async fn close(&self) {}
    }

    struct FakeDialer {
        fail_servers: Vec<String>,
        dial_count: AtomicUsize,
        dead_tools: Vec<String>,
    }

    impl FakeDialer {
        fn new() -> Self {
            Self {
                fail_servers: Vec::new(),
                dial_count: AtomicUsize::new(0),
                dead_tools: Vec::new(),
            }
        }
    }

    #[async_trait]
    impl McpDialer for FakeDialer {
        async fn dial(&self, config: &McpServerConfig) -> McpResult<Arc<dyn McpConnectionHandle>> {
            self.dial_count.fetch_add(1, Ordering::SeqCst);
            if self.fail_servers.contains(&config.name) {
                return Err(McpError::ConnectFailed {
                    server: config.name.clone(),
                    reason: "boom".to_string(),
                });
            }
            Ok(Arc::new(FakeHandle {
                server: config.name.clone(),
                fail_tools: self.dead_tools.contains(&config.name),
            }))
        }
    }

    fn cfg(name: &str) -> McpServerConfig {
        McpServerConfig::stdio(UserId::new("u1"), name, "mcp-server")
    }

    #[tokio::test]
    async fn connect_registers_every_enabled_server() {
        let pool = McpPool::new(Arc::new(FakeDialer::new()), PoolLimits::default());
        let user = UserId::new("u1");
        pool.connect(&user, &[cfg("a"), cfg("b")]).await.unwrap();
        assert_eq!(pool.total_connections().await, 2);
        assert_eq!(pool.connected_servers(&user).await.len(), 2);
    }

    #[tokio::test]
    async fn disabled_servers_are_skipped() {
        let pool = McpPool::new(Arc::new(FakeDialer::new()), PoolLimits::default());
        let user = UserId::new("u1");
        let mut disabled = cfg("a");
        disabled.disabled = true;
        pool.connect(&user, &[disabled]).await.unwrap();
        assert_eq!(pool.total_connections().await, 0);
    }

    #[tokio::test]
    async fn partial_failure_rolls_back_the_whole_batch() {
        let dialer = FakeDialer {
            fail_servers: vec!["b".to_string()],
            ..FakeDialer::new()
        };
        let pool = McpPool::new(Arc::new(dialer), PoolLimits::default());
        let user = UserId::new("u1");
        let result = pool.connect(&user, &[cfg("a"), cfg("b")]).await;
        assert!(result.is_err());
        assert_eq!(pool.total_connections().await, 0);
        assert!(pool.connected_servers(&user).await.is_empty());
    }

    #[tokio::test]
    async fn per_user_cap_is_enforced() {
        let pool = McpPool::new(
            Arc::new(FakeDialer::new()),
            PoolLimits {
                max_per_user: 1,
                max_total: 100,
            },
        );
        let user = UserId::new("u1");
        let result = pool.connect(&user, &[cfg("a"), cfg("b")]).await;
        assert!(matches!(result, Err(McpError::CapacityExceeded)));
        assert_eq!(pool.total_connections().await, 0);
    }

    #[tokio::test]
    async fn total_cap_is_enforced_across_users() {
        let pool = McpPool::new(
            Arc::new(FakeDialer::new()),
            PoolLimits {
                max_per_user: 10,
                max_total: 1,
            },
        );
        let u1 = UserId::new("u1");
        let u2 = UserId::new("u2");
        pool.connect(&u1, &[cfg("a")]).await.unwrap();
        let result = pool.connect(&u2, &[cfg("a")]).await;
        assert!(matches!(result, Err(McpError::CapacityExceeded)));
    }

    #[tokio::test]
    async fn reconnecting_an_already_connected_server_is_a_noop() {
        let pool = McpPool::new(Arc::new(FakeDialer::new()), PoolLimits::default());
        let user = UserId::new("u1");
        pool.connect(&user, &[cfg("a")]).await.unwrap();
        pool.connect(&user, &[cfg("a")]).await.unwrap();
        assert_eq!(pool.total_connections().await, 1);
    }

    #[tokio::test]
    async fn disconnect_one_server_leaves_others_intact() {
        let pool = McpPool::new(Arc::new(FakeDialer::new()), PoolLimits::default());
        let user = UserId::new("u1");
        pool.connect(&user, &[cfg("a"), cfg("b")]).await.unwrap();
        pool.disconnect(&user, Some("a")).await;
        assert_eq!(pool.total_connections().await, 1);
        let remaining = pool.connected_servers(&user).await;
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].name, "b");
    }

    #[tokio::test]
    async fn disconnect_all_servers_for_one_user() {
        let pool = McpPool::new(Arc::new(FakeDialer::new()), PoolLimits::default());
        let user = UserId::new("u1");
        pool.connect(&user, &[cfg("a"), cfg("b")]).await.unwrap();
        pool.disconnect(&user, None).await;
        assert_eq!(pool.total_connections().await, 0);
        assert!(pool.connected_servers(&user).await.is_empty());
    }

    #[tokio::test]
    async fn health_check_drops_unresponsive_servers() {
        let dialer = FakeDialer {
            dead_tools: vec!["a".to_string()],
            ..FakeDialer::new()
        };
        let pool = McpPool::new(Arc::new(dialer), PoolLimits::default());
        let user = UserId::new("u1");
        pool.connect(&user, &[cfg("a"), cfg("b")]).await.unwrap();
        let dead = pool.health_check(&user).await;
        assert_eq!(dead, vec!["a".to_string()]);
        assert_eq!(pool.total_connections().await, 1);
    }

    #[tokio::test]
    async fn call_tool_against_unknown_server_is_an_error() {
        let pool = McpPool::new(Arc::new(FakeDialer::new()), PoolLimits::default());
        let user = UserId::new("u1");
        let result = pool.call_tool(&user, "ghost", "echo", Value::Null).await;
        assert!(matches!(result, Err(McpError::ServerNotConnected { .. })));
    }

    #[tokio::test]
    async fn get_tools_aggregates_across_servers() {
        let pool = McpPool::new(Arc::new(FakeDialer::new()), PoolLimits::default());
        let user = UserId::new("u1");
        pool.connect(&user, &[cfg("a"), cfg("b")]).await.unwrap();
        let tools = pool.get_tools(&user).await.unwrap();
        assert_eq!(tools.len(), 2);
    }
}
