//! `SurrealDB`-backed implementations of the store traits, sharing one
//! [`Database`] connection pool per spec §3 ("a relational-database
//! implementation sharing one connection pool").
//!
//! Tables follow the `s_` prefix convention from spec §6: `s_session`,
//! `s_message`, `s_user`, `s_mcp_server`, `s_schema_version`. Every
//! tenant-scoped table keys its isolation lookups on an indexed `user_id`
//! field, queried with bound parameters (never string-interpolated) to keep
//! user isolation (§8) from depending on escaping discipline.

use async_trait::async_trait;
use chrono::Utc;
use dataagent_core::{
    AssistantId, McpServerConfig, Message, MessageId, Role, SchemaVersion, Session, SessionId,
    UserId, UserProfile,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::db::Database;
use crate::error::{StorageError, StorageResult};
use crate::traits::{
    McpConfigStore, MessageStore, MigrationScript, SchemaMigrator, SessionStore, UserProfileStore,
};

fn internal(e: surrealdb::Error) -> StorageError {
    StorageError::Internal(e.to_string())
}

/// `SurrealDB`-backed [`SessionStore`].
pub struct SurrealSessionStore {
    db: Arc<Database>,
}

impl SurrealSessionStore {
    /// Build a store over a shared connection.
    #[must_use]
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl SessionStore for SurrealSessionStore {
    async fn create(&self, user_id: UserId, assistant_id: AssistantId) -> StorageResult<Session> {
        let session = Session::new(user_id, assistant_id);
        let _: Option<Session> = self
            .db
            .client()
            .create(("s_session", session.session_id.to_string()))
            .content(session.clone())
            .await
            .map_err(internal)?;
        Ok(session)
    }

    async fn get(&self, id: SessionId) -> StorageResult<Option<Session>> {
        self.db
            .client()
            .select(("s_session", id.to_string()))
            .await
            .map_err(internal)
    }

    async fn update(&self, session: Session) -> StorageResult<()> {
        let _: Option<Session> = self
            .db
            .client()
            .update(("s_session", session.session_id.to_string()))
            .content(session)
            .await
            .map_err(internal)?;
        Ok(())
    }

    async fn delete(&self, id: SessionId) -> StorageResult<()> {
        let _: Option<Session> = self
            .db
            .client()
            .delete(("s_session", id.to_string()))
            .await
            .map_err(internal)?;
        Ok(())
    }

    async fn list_by_user(&self, user_id: &UserId) -> StorageResult<Vec<Session>> {
        let mut result = self
            .db
            .client()
            .query("SELECT * FROM s_session WHERE user_id = $user_id ORDER BY last_active DESC")
            .bind(("user_id", user_id.clone()))
            .await
            .map_err(internal)?;
        result.take(0).map_err(internal)
    }

    async fn list_by_assistant(&self, assistant_id: &AssistantId) -> StorageResult<Vec<Session>> {
        let mut result = self
            .db
            .client()
            .query(
                "SELECT * FROM s_session WHERE assistant_id = $assistant_id ORDER BY last_active DESC",
            )
            .bind(("assistant_id", assistant_id.clone()))
            .await
            .map_err(internal)?;
        result.take(0).map_err(internal)
    }

    async fn cleanup_expired(&self, timeout: chrono::Duration) -> StorageResult<usize> {
        let cutoff = Utc::now() - timeout;
        let mut result = self
            .db
            .client()
            .query("DELETE FROM s_session WHERE last_active < $cutoff RETURN BEFORE")
            .bind(("cutoff", cutoff))
            .await
            .map_err(internal)?;
        let deleted: Vec<Session> = result.take(0).map_err(internal)?;
        Ok(deleted.len())
    }
}

/// A persisted message row, keyed separately from [`Message`] so the
/// insertion-order tie-break (`sequence`) round-trips through `SurrealQL`
/// without leaking into the public `Message` API surface callers see back.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct MessageRow {
    message_id: MessageId,
    session_id: SessionId,
    role: Role,
    content: String,
    created_at: chrono::DateTime<Utc>,
    metadata: std::collections::HashMap<String, Value>,
    sequence: u64,
}

impl From<MessageRow> for Message {
    fn from(row: MessageRow) -> Self {
        Message {
            message_id: row.message_id,
            session_id: row.session_id,
            role: row.role,
            content: row.content,
            created_at: row.created_at,
            metadata: row.metadata,
            sequence: row.sequence,
        }
    }
}

/// `SurrealDB`-backed [`MessageStore`].
pub struct SurrealMessageStore {
    db: Arc<Database>,
    sequence: AtomicU64,
}

impl SurrealMessageStore {
    /// Build a store over a shared connection.
    #[must_use]
    pub fn new(db: Arc<Database>) -> Self {
        Self {
            db,
            sequence: AtomicU64::new(0),
        }
    }
}

#[async_trait]
impl MessageStore for SurrealMessageStore {
    async fn save_message(
        &self,
        session_id: SessionId,
        role: Role,
        content: String,
        metadata: Option<Value>,
    ) -> StorageResult<MessageId> {
        let row = MessageRow {
            message_id: MessageId::new(),
            session_id,
            role,
            content,
            created_at: Utc::now(),
            metadata: match metadata {
                Some(Value::Object(map)) => map.into_iter().collect(),
                _ => std::collections::HashMap::new(),
            },
            sequence: self.sequence.fetch_add(1, Ordering::SeqCst),
        };
        let id = row.message_id;
        let _: Option<MessageRow> = self
            .db
            .client()
            .create(("s_message", id.to_string()))
            .content(row)
            .await
            .map_err(internal)?;
        Ok(id)
    }

    async fn get_messages(
        &self,
        session_id: SessionId,
        limit: usize,
        offset: usize,
    ) -> StorageResult<Vec<Message>> {
        let mut result = self
            .db
            .client()
            .query(
                "SELECT * FROM s_message WHERE session_id = $session_id \
                 ORDER BY created_at ASC, sequence ASC LIMIT $limit START $offset",
            )
            .bind(("session_id", session_id))
            .bind(("limit", limit as i64))
            .bind(("offset", offset as i64))
            .await
            .map_err(internal)?;
        let rows: Vec<MessageRow> = result.take(0).map_err(internal)?;
        Ok(rows.into_iter().map(Message::from).collect())
    }

    async fn count_messages(&self, session_id: SessionId) -> StorageResult<usize> {
        let mut result = self
            .db
            .client()
            .query("SELECT count() FROM s_message WHERE session_id = $session_id GROUP ALL")
            .bind(("session_id", session_id))
            .await
            .map_err(internal)?;
        #[derive(Deserialize)]
        struct Count {
            count: usize,
        }
        let counts: Vec<Count> = result.take(0).map_err(internal)?;
        Ok(counts.first().map_or(0, |c| c.count))
    }

    async fn delete_messages(&self, session_id: SessionId) -> StorageResult<usize> {
        let mut result = self
            .db
            .client()
            .query("DELETE FROM s_message WHERE session_id = $session_id RETURN BEFORE")
            .bind(("session_id", session_id))
            .await
            .map_err(internal)?;
        let deleted: Vec<MessageRow> = result.take(0).map_err(internal)?;
        Ok(deleted.len())
    }
}

/// `SurrealDB`-backed [`UserProfileStore`].
pub struct SurrealUserProfileStore {
    db: Arc<Database>,
}

impl SurrealUserProfileStore {
    /// Build a store over a shared connection.
    #[must_use]
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl UserProfileStore for SurrealUserProfileStore {
    async fn get(&self, user_id: &UserId) -> StorageResult<Option<UserProfile>> {
        self.db
            .client()
            .select(("s_user", user_id.as_str()))
            .await
            .map_err(internal)
    }

    async fn upsert(&self, profile: UserProfile) -> StorageResult<()> {
        let _: Option<UserProfile> = self
            .db
            .client()
            .update(("s_user", profile.user_id.as_str().to_string()))
            .content(profile)
            .await
            .map_err(internal)?;
        Ok(())
    }

    async fn delete(&self, user_id: &UserId) -> StorageResult<()> {
        let _: Option<UserProfile> = self
            .db
            .client()
            .delete(("s_user", user_id.as_str()))
            .await
            .map_err(internal)?;
        Ok(())
    }
}

fn server_row_id(user_id: &UserId, name: &str) -> String {
    format!("{user_id}:{name}")
}

/// `SurrealDB`-backed [`McpConfigStore`].
pub struct SurrealMcpConfigStore {
    db: Arc<Database>,
}

impl SurrealMcpConfigStore {
    /// Build a store over a shared connection.
    #[must_use]
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl McpConfigStore for SurrealMcpConfigStore {
    async fn get_user_config(&self, user_id: &UserId) -> StorageResult<Vec<McpServerConfig>> {
        let mut result = self
            .db
            .client()
            .query("SELECT * FROM s_mcp_server WHERE user_id = $user_id")
            .bind(("user_id", user_id.clone()))
            .await
            .map_err(internal)?;
        result.take(0).map_err(internal)
    }

    async fn save_user_config(
        &self,
        user_id: &UserId,
        servers: Vec<McpServerConfig>,
    ) -> StorageResult<()> {
        self.delete_user_config(user_id).await?;
        for server in servers {
            self.add_server(server).await?;
        }
        Ok(())
    }

    async fn delete_user_config(&self, user_id: &UserId) -> StorageResult<()> {
        self.db
            .client()
            .query("DELETE FROM s_mcp_server WHERE user_id = $user_id")
            .bind(("user_id", user_id.clone()))
            .await
            .map_err(internal)?;
        Ok(())
    }

    async fn add_server(&self, server: McpServerConfig) -> StorageResult<()> {
        let id = server_row_id(&server.user_id, &server.name);
        let _: Option<McpServerConfig> = self
            .db
            .client()
            .update(("s_mcp_server", id))
            .content(server)
            .await
            .map_err(internal)?;
        Ok(())
    }

    async fn remove_server(&self, user_id: &UserId, name: &str) -> StorageResult<()> {
        let id = server_row_id(user_id, name);
        let _: Option<McpServerConfig> = self
            .db
            .client()
            .delete(("s_mcp_server", id))
            .await
            .map_err(internal)?;
        Ok(())
    }

    async fn get_server(
        &self,
        user_id: &UserId,
        name: &str,
    ) -> StorageResult<Option<McpServerConfig>> {
        let id = server_row_id(user_id, name);
        self.db
            .client()
            .select(("s_mcp_server", id))
            .await
            .map_err(internal)
    }
}

/// `SurrealDB`-backed [`SchemaMigrator`] (C12): an append-only
/// `s_schema_version` ledger, one transaction per script.
pub struct SurrealSchemaMigrator {
    db: Arc<Database>,
}

impl SurrealSchemaMigrator {
    /// Build a migrator over a shared connection.
    #[must_use]
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl SchemaMigrator for SurrealSchemaMigrator {
    async fn migrate(&self, scripts: &[MigrationScript]) -> StorageResult<Vec<SchemaVersion>> {
        let applied = self.history().await?;
        let applied_versions: std::collections::HashSet<String> =
            applied.into_iter().map(|row| row.version).collect();

        let mut newly_applied = Vec::new();
        for script in scripts {
            if applied_versions.contains(&script.version) {
                continue;
            }

            let body = script.statements.join(";\n");
            let txn = format!("BEGIN TRANSACTION;\n{body};\nCOMMIT TRANSACTION;");
            self.db
                .client()
                .query(txn)
                .await
                .map_err(|e| StorageError::MigrationFailed {
                    version: script.version.clone(),
                    reason: e.to_string(),
                })?
                .check()
                .map_err(|e| StorageError::MigrationFailed {
                    version: script.version.clone(),
                    reason: e.to_string(),
                })?;

            let row = SchemaVersion {
                version: script.version.clone(),
                description: script.description.clone(),
                checksum: script.checksum(),
                applied_at: Utc::now(),
                applied_by: "system".to_string(),
            };
            let _: Option<SchemaVersion> = self
                .db
                .client()
                .create(("s_schema_version", row.version.clone()))
                .content(row.clone())
                .await
                .map_err(internal)?;
            newly_applied.push(row);
        }
        Ok(newly_applied)
    }

    async fn get_current_version(&self) -> StorageResult<Option<SchemaVersion>> {
        let mut result = self
            .db
            .client()
            .query("SELECT * FROM s_schema_version ORDER BY applied_at DESC LIMIT 1")
            .await
            .map_err(internal)?;
        let rows: Vec<SchemaVersion> = result.take(0).map_err(internal)?;
        Ok(rows.into_iter().next())
    }

    async fn rollback(&self, version: &str) -> StorageResult<usize> {
        let mut result = self
            .db
            .client()
            .query(
                "SELECT * FROM s_schema_version WHERE version = $version ORDER BY applied_at DESC LIMIT 1",
            )
            .bind(("version", version.to_string()))
            .await
            .map_err(internal)?;
        let target: Vec<SchemaVersion> = result.take(0).map_err(internal)?;
        let Some(target) = target.into_iter().next() else {
            return Err(StorageError::NotFound(format!(
                "schema version {version} not in ledger"
            )));
        };

        let mut result = self
            .db
            .client()
            .query("DELETE FROM s_schema_version WHERE applied_at > $cutoff RETURN BEFORE")
            .bind(("cutoff", target.applied_at))
            .await
            .map_err(internal)?;
        let removed: Vec<SchemaVersion> = result.take(0).map_err(internal)?;
        Ok(removed.len())
    }

    async fn history(&self) -> StorageResult<Vec<SchemaVersion>> {
        let mut result = self
            .db
            .client()
            .query("SELECT * FROM s_schema_version ORDER BY applied_at ASC")
            .await
            .map_err(internal)?;
        result.take(0).map_err(internal)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn memory_db() -> Arc<Database> {
        Arc::new(Database::connect_memory().await.unwrap())
    }

    #[tokio::test]
    async fn session_store_roundtrips_through_surrealdb() {
        let store = SurrealSessionStore::new(memory_db().await);
        let created = store
            .create(UserId::new("alice"), AssistantId::new("default"))
            .await
            .unwrap();

        let fetched = store.get(created.session_id).await.unwrap().unwrap();
        assert_eq!(fetched.user_id, created.user_id);

        store.delete(created.session_id).await.unwrap();
        assert!(store.get(created.session_id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn message_store_orders_by_created_at_then_sequence() {
        let store = SurrealMessageStore::new(memory_db().await);
        let session_id = SessionId::new();
        for i in 0..3 {
            store
                .save_message(session_id, Role::User, format!("m{i}"), None)
                .await
                .unwrap();
        }
        let page = store.get_messages(session_id, 10, 0).await.unwrap();
        assert_eq!(
            page.iter().map(|m| m.content.clone()).collect::<Vec<_>>(),
            vec!["m0", "m1", "m2"]
        );
        assert_eq!(store.count_messages(session_id).await.unwrap(), 3);
    }

    #[tokio::test]
    async fn mcp_config_store_isolates_users() {
        let store = SurrealMcpConfigStore::new(memory_db().await);
        let alice = UserId::new("alice");
        let bob = UserId::new("bob");
        store
            .add_server(McpServerConfig::stdio(alice.clone(), "fs", "npx"))
            .await
            .unwrap();
        store
            .add_server(McpServerConfig::stdio(bob.clone(), "fs", "npx"))
            .await
            .unwrap();

        store.delete_user_config(&alice).await.unwrap();

        assert!(store.get_user_config(&alice).await.unwrap().is_empty());
        assert_eq!(store.get_user_config(&bob).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn migrate_is_idempotent_against_surrealdb_ledger() {
        let migrator = SurrealSchemaMigrator::new(memory_db().await);
        let scripts = vec![MigrationScript {
            version: "0001".to_string(),
            description: "init".to_string(),
            statements: vec!["DEFINE TABLE s_session SCHEMALESS".to_string()],
        }];

        let first = migrator.migrate(&scripts).await.unwrap();
        assert_eq!(first.len(), 1);
        let second = migrator.migrate(&scripts).await.unwrap();
        assert!(second.is_empty());
    }
}
