//! Capability-shaped store traits (C2–C5, C12, §9 "Capability-shaped
//! stores"). Each store is specified by its operation set, not a base
//! class; the in-memory and `SurrealDB` backends are peers, neither a
//! subclass of the other.

use async_trait::async_trait;
use dataagent_core::{
    AssistantId, McpServerConfig, Message, Role, Rule, SchemaVersion, Session, SessionId, UserId,
    UserProfile,
};

use crate::error::StorageResult;

/// Session CRUD plus user/assistant indexes and TTL expiry (C2).
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Create and persist a new session.
    async fn create(&self, user_id: UserId, assistant_id: AssistantId) -> StorageResult<Session>;

    /// Fetch a session by id.
    async fn get(&self, id: SessionId) -> StorageResult<Option<Session>>;

    /// Replace a session's stored row. Does **not** implicitly touch
    /// `last_active` — see `dataagent-session`'s session manager for the
    /// one call site that does (§9 open question).
    async fn update(&self, session: Session) -> StorageResult<()>;

    /// Delete a session by id. No-op (not an error) if absent.
    async fn delete(&self, id: SessionId) -> StorageResult<()>;

    /// List a user's sessions, sorted by `last_active` descending. Must
    /// never return another user's rows (§8, "Session isolation").
    async fn list_by_user(&self, user_id: &UserId) -> StorageResult<Vec<Session>>;

    /// List sessions for an assistant, sorted by `last_active` descending.
    async fn list_by_assistant(&self, assistant_id: &AssistantId) -> StorageResult<Vec<Session>>;

    /// Delete all sessions whose `last_active` is older than `timeout`
    /// relative to now. Returns the number deleted.
    async fn cleanup_expired(&self, timeout: chrono::Duration) -> StorageResult<usize>;
}

/// Append-only message store with ordered range queries (C3).
#[async_trait]
pub trait MessageStore: Send + Sync {
    /// Append a message, assigning it a fresh id and `created_at = now`.
    /// Returns the assigned id.
    async fn save_message(
        &self,
        session_id: SessionId,
        role: Role,
        content: String,
        metadata: Option<serde_json::Value>,
    ) -> StorageResult<dataagent_core::MessageId>;

    /// Fetch a page of a session's messages in `created_at` ascending order
    /// (ties broken by insertion order). Returns
    /// `min(limit, max(0, total - offset))` rows.
    async fn get_messages(
        &self,
        session_id: SessionId,
        limit: usize,
        offset: usize,
    ) -> StorageResult<Vec<Message>>;

    /// Count a session's messages.
    async fn count_messages(&self, session_id: SessionId) -> StorageResult<usize>;

    /// Delete all of a session's messages. Returns the number deleted.
    async fn delete_messages(&self, session_id: SessionId) -> StorageResult<usize>;
}

/// Per-user profile CRUD, including an opaque custom-field map (C4).
#[async_trait]
pub trait UserProfileStore: Send + Sync {
    /// Fetch a user's profile.
    async fn get(&self, user_id: &UserId) -> StorageResult<Option<UserProfile>>;

    /// Insert or replace a user's profile.
    async fn upsert(&self, profile: UserProfile) -> StorageResult<()>;

    /// Delete a user's profile.
    async fn delete(&self, user_id: &UserId) -> StorageResult<()>;
}

/// Per-user MCP server config CRUD with isolation (C5).
#[async_trait]
pub trait McpConfigStore: Send + Sync {
    /// All of a user's server configs.
    async fn get_user_config(&self, user_id: &UserId) -> StorageResult<Vec<McpServerConfig>>;

    /// Replace a user's entire config set: prior servers for that user are
    /// removed and replaced.
    async fn save_user_config(
        &self,
        user_id: &UserId,
        servers: Vec<McpServerConfig>,
    ) -> StorageResult<()>;

    /// Delete all of a user's server configs.
    async fn delete_user_config(&self, user_id: &UserId) -> StorageResult<()>;

    /// Upsert a single server by `(user_id, server.name)`.
    async fn add_server(&self, server: McpServerConfig) -> StorageResult<()>;

    /// Remove one server by name.
    async fn remove_server(&self, user_id: &UserId, name: &str) -> StorageResult<()>;

    /// Fetch one server by name.
    async fn get_server(
        &self,
        user_id: &UserId,
        name: &str,
    ) -> StorageResult<Option<McpServerConfig>>;
}

/// The append-only schema migration ledger (C12).
#[async_trait]
pub trait SchemaMigrator: Send + Sync {
    /// Apply all pending migration scripts, in order, each in its own
    /// transaction, appending a ledger row per script. Re-running against
    /// an up-to-date ledger is a no-op.
    ///
    /// # Errors
    /// A migration failure aborts its own transaction and surfaces the
    /// error; no partial ledger row is written.
    async fn migrate(&self, scripts: &[MigrationScript]) -> StorageResult<Vec<SchemaVersion>>;

    /// The newest applied version, if any.
    async fn get_current_version(&self) -> StorageResult<Option<SchemaVersion>>;

    /// Remove ledger rows newer than `version`. Rollback *scripts* are out
    /// of scope — this only edits the ledger.
    async fn rollback(&self, version: &str) -> StorageResult<usize>;

    /// The full applied ledger, oldest first.
    async fn history(&self) -> StorageResult<Vec<SchemaVersion>>;
}

/// One pending migration: a version, description, and the SQL/SurrealQL
/// statements to run inside a single transaction.
#[derive(Debug, Clone)]
pub struct MigrationScript {
    /// Version identifier; must sort consistently with other scripts.
    pub version: String,
    /// Human-readable description.
    pub description: String,
    /// Statements to execute, in order, inside one transaction.
    pub statements: Vec<String>,
}

impl MigrationScript {
    /// Checksum used for the ledger row: a blake3-style content hash is
    /// overkill here since migrations are never distributed untrusted; a
    /// deterministic hash of version + statements is sufficient to detect
    /// drift.
    #[must_use]
    pub fn checksum(&self) -> String {
        use std::hash::{Hash, Hasher};
        let mut hasher = std::collections::hash_map::DefaultHasher::new();
        self.version.hash(&mut hasher);
        for stmt in &self.statements {
            stmt.hash(&mut hasher);
        }
        format!("{:016x}", hasher.finish())
    }
}
