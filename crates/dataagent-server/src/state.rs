//! Shared application state threaded through every axum handler.

use std::sync::Arc;
use std::time::Instant;

use dataagent_config::Config;
use dataagent_dispatch::Dispatcher;
use dataagent_hitl::HitlCoordinator;
use dataagent_mcp::McpPool;
use dataagent_rules::{MemoryLoader, RuleEngine};
use dataagent_session::{ConnectionManager, SessionManager};
use dataagent_storage::traits::{McpConfigStore, MessageStore, UserProfileStore};

use crate::executor::ExecutorFactory;

/// Everything a handler needs to serve a request, built once at startup by
/// [`crate::bootstrap::build_state`].
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub sessions: Arc<SessionManager>,
    pub messages: Arc<dyn MessageStore>,
    pub profiles: Arc<dyn UserProfileStore>,
    pub mcp_configs: Arc<dyn McpConfigStore>,
    pub mcp_pool: Arc<McpPool>,
    pub rule_engine: Arc<RuleEngine>,
    pub memory_loader: Arc<MemoryLoader>,
    pub hitl: Arc<HitlCoordinator>,
    pub connections: Arc<ConnectionManager>,
    pub dispatcher: Arc<Dispatcher>,
    pub executor_factory: Arc<dyn ExecutorFactory>,
    pub started_at: Instant,
}

impl AppState {
    /// Seconds since this state (and therefore the server) was built.
    #[must_use]
    pub fn uptime_seconds(&self) -> u64 {
        self.started_at.elapsed().as_secs()
    }
}
