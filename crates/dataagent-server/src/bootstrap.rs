//! Builds [`AppState`] from a loaded [`Config`] (C2–C13 wiring).

use std::sync::Arc;
use std::time::Duration;
use std::time::Instant;

use dataagent_config::{Config, StorageBackendKind};
use dataagent_dispatch::Dispatcher;
use dataagent_hitl::HitlCoordinator;
use dataagent_mcp::{McpPool, PoolLimits, RmcpDialer};
use dataagent_rules::{MemoryLoader, RuleEngine, TenancyMode, load_rules};
use dataagent_session::{ConnectionManager, SessionManager};
use dataagent_storage::traits::{MigrationScript, SchemaMigrator};
use dataagent_storage::{
    Database, MemoryMcpConfigStore, MemoryMessageStore, MemorySchemaMigrator, MemorySessionStore,
    MemoryUserProfileStore, StorageResult, SurrealMcpConfigStore, SurrealMessageStore,
    SurrealSchemaMigrator, SurrealSessionStore, SurrealUserProfileStore,
};

use crate::executor::{EchoExecutorFactory, ExecutorFactory};
use crate::state::AppState;

/// The baseline ledger row every fresh backend applies. `dataagent-storage`
/// ships no migration list of its own (C12 only defines the mechanism); this
/// is the one script the server actually runs at startup.
fn baseline_migrations() -> Vec<MigrationScript> {
    vec![MigrationScript {
        version: "0001".to_string(),
        description: "baseline schema".to_string(),
        statements: vec!["-- baseline: sessions, messages, profiles, mcp_configs".to_string()],
    }]
}

struct StorageHandles {
    sessions: Arc<dyn dataagent_storage::traits::SessionStore>,
    messages: Arc<dyn dataagent_storage::traits::MessageStore>,
    profiles: Arc<dyn dataagent_storage::traits::UserProfileStore>,
    mcp_configs: Arc<dyn dataagent_storage::traits::McpConfigStore>,
    migrator: Arc<dyn SchemaMigrator>,
}

async fn build_storage(config: &Config) -> StorageResult<StorageHandles> {
    match config.storage.backend {
        StorageBackendKind::Memory => {
            let sessions = Arc::new(MemorySessionStore::new());
            let messages = Arc::new(MemoryMessageStore::new());
            let profiles = Arc::new(MemoryUserProfileStore::new());
            let mcp_configs = Arc::new(MemoryMcpConfigStore::new());
            let migrator: Arc<dyn SchemaMigrator> = Arc::new(MemorySchemaMigrator::new());
            Ok(StorageHandles {
                sessions,
                messages,
                profiles,
                mcp_configs,
                migrator,
            })
        },
        StorageBackendKind::Surreal => {
            // `Database`'s constructors hardcode their own namespace/database
            // (`dataagent`/`main` or `dataagent`/`test`) rather than reading
            // `config.storage.namespace`/`database`; `connection_string`
            // drives only the embedded-vs-memory choice. Documented as a
            // known simplification in DESIGN.md.
            let db = if config.storage.connection_string == "mem://" {
                Database::connect_memory().await?
            } else {
                Database::connect_embedded(&config.storage.connection_string).await?
            };
            let db = Arc::new(db);
            let sessions = Arc::new(SurrealSessionStore::new(db.clone()));
            let messages = Arc::new(SurrealMessageStore::new(db.clone()));
            let profiles = Arc::new(SurrealUserProfileStore::new(db.clone()));
            let mcp_configs = Arc::new(SurrealMcpConfigStore::new(db.clone()));
            let migrator: Arc<dyn SchemaMigrator> = Arc::new(SurrealSchemaMigrator::new(db));
            Ok(StorageHandles {
                sessions,
                messages,
                profiles,
                mcp_configs,
                migrator,
            })
        },
    }
}

/// Build the full [`AppState`] graph from a resolved configuration.
///
/// # Errors
/// Propagates storage connection and migration failures.
pub async fn build_state(config: Config) -> StorageResult<AppState> {
    let config = Arc::new(config);

    let storage = build_storage(&config).await?;
    storage.migrator.migrate(&baseline_migrations()).await?;

    let rules = load_rules(&config.rules.search_paths);
    let rule_engine = Arc::new(RuleEngine::new(rules, config.rules.max_content_size));
    let memory_loader = Arc::new(MemoryLoader::new(
        config.rules.data_root.clone(),
        config.rules.app_name.clone(),
        TenancyMode::MultiTenant,
    ));

    let hitl = Arc::new(HitlCoordinator::new(Duration::from_secs(config.hitl.timeout_secs)));
    let connections = Arc::new(ConnectionManager::new(config.connection.max_total, hitl.clone()));

    let sessions = Arc::new(SessionManager::new(
        storage.sessions,
        chrono::Duration::seconds(i64::try_from(config.session.timeout_secs).unwrap_or(i64::MAX)),
        Duration::from_secs(config.session.cleanup_interval_secs),
    ));
    sessions.start().await;

    let mcp_pool = Arc::new(McpPool::new(
        Arc::new(RmcpDialer),
        PoolLimits {
            max_per_user: config.mcp.max_connections_per_user,
            max_total: config.mcp.max_connections_total,
        },
    ));

    let dispatcher = Arc::new(Dispatcher::new(connections.clone(), hitl.clone(), storage.messages.clone()));

    let executor_factory: Arc<dyn ExecutorFactory> = Arc::new(EchoExecutorFactory);

    Ok(AppState {
        config,
        sessions,
        messages: storage.messages,
        profiles: storage.profiles,
        mcp_configs: storage.mcp_configs,
        mcp_pool,
        rule_engine,
        memory_loader,
        hitl,
        connections,
        dispatcher,
        executor_factory,
        started_at: Instant::now(),
    })
}
