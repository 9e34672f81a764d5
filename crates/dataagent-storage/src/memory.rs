//! In-memory reference implementations of the store traits.
//!
//! Each store is guarded by a single `tokio::sync::Mutex`, matching the
//! concurrency model in spec §5: "In-memory stores: per-store mutex; no
//! cross-store lock acquisition ordering is required."

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use dataagent_core::{
    AssistantId, McpServerConfig, Message, MessageId, Role, SchemaVersion, Session, SessionId,
    UserId, UserProfile,
};
use serde_json::Value;
use tokio::sync::Mutex;

use crate::error::{StorageError, StorageResult};
use crate::traits::{McpConfigStore, MessageStore, MigrationScript, SchemaMigrator, SessionStore, UserProfileStore};

/// In-memory [`SessionStore`].
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    sessions: Mutex<HashMap<SessionId, Session>>,
}

impl MemorySessionStore {
    /// Construct an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn create(&self, user_id: UserId, assistant_id: AssistantId) -> StorageResult<Session> {
        let session = Session::new(user_id, assistant_id);
        self.sessions
            .lock()
            .await
            .insert(session.session_id, session.clone());
        Ok(session)
    }

    async fn get(&self, id: SessionId) -> StorageResult<Option<Session>> {
        Ok(self.sessions.lock().await.get(&id).cloned())
    }

    async fn update(&self, session: Session) -> StorageResult<()> {
        self.sessions
            .lock()
            .await
            .insert(session.session_id, session);
        Ok(())
    }

    async fn delete(&self, id: SessionId) -> StorageResult<()> {
        self.sessions.lock().await.remove(&id);
        Ok(())
    }

    async fn list_by_user(&self, user_id: &UserId) -> StorageResult<Vec<Session>> {
        let mut out: Vec<Session> = self
            .sessions
            .lock()
            .await
            .values()
            .filter(|s| &s.user_id == user_id)
            .cloned()
            .collect();
        out.sort_by(|a, b| b.last_active.cmp(&a.last_active));
        Ok(out)
    }

    async fn list_by_assistant(&self, assistant_id: &AssistantId) -> StorageResult<Vec<Session>> {
        let mut out: Vec<Session> = self
            .sessions
            .lock()
            .await
            .values()
            .filter(|s| &s.assistant_id == assistant_id)
            .cloned()
            .collect();
        out.sort_by(|a, b| b.last_active.cmp(&a.last_active));
        Ok(out)
    }

    async fn cleanup_expired(&self, timeout: chrono::Duration) -> StorageResult<usize> {
        let now = Utc::now();
        let mut sessions = self.sessions.lock().await;
        let expired: Vec<SessionId> = sessions
            .values()
            .filter(|s| s.is_expired(timeout, now))
            .map(|s| s.session_id)
            .collect();
        for id in &expired {
            sessions.remove(id);
        }
        Ok(expired.len())
    }
}

/// In-memory [`MessageStore`].
#[derive(Debug, Default)]
pub struct MemoryMessageStore {
    by_session: Mutex<HashMap<SessionId, Vec<Message>>>,
    sequence: AtomicU64,
}

impl MemoryMessageStore {
    /// Construct an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl MessageStore for MemoryMessageStore {
    async fn save_message(
        &self,
        session_id: SessionId,
        role: Role,
        content: String,
        metadata: Option<Value>,
    ) -> StorageResult<MessageId> {
        let mut message = Message::new(session_id, role, content);
        message.created_at = Utc::now();
        message.sequence = self.sequence.fetch_add(1, Ordering::SeqCst);
        if let Some(Value::Object(map)) = metadata {
            message.metadata = map.into_iter().collect();
        }
        let id = message.message_id;
        self.by_session
            .lock()
            .await
            .entry(session_id)
            .or_default()
            .push(message);
        Ok(id)
    }

    async fn get_messages(
        &self,
        session_id: SessionId,
        limit: usize,
        offset: usize,
    ) -> StorageResult<Vec<Message>> {
        let by_session = self.by_session.lock().await;
        let Some(messages) = by_session.get(&session_id) else {
            return Ok(Vec::new());
        };
        let mut ordered = messages.clone();
        ordered.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.sequence.cmp(&b.sequence)));
        Ok(ordered.into_iter().skip(offset).take(limit).collect())
    }

    async fn count_messages(&self, session_id: SessionId) -> StorageResult<usize> {
        Ok(self
            .by_session
            .lock()
            .await
            .get(&session_id)
            .map_or(0, Vec::len))
    }

    async fn delete_messages(&self, session_id: SessionId) -> StorageResult<usize> {
        Ok(self
            .by_session
            .lock()
            .await
            .remove(&session_id)
            .map_or(0, |v| v.len()))
    }
}

/// In-memory [`UserProfileStore`].
#[derive(Debug, Default)]
pub struct MemoryUserProfileStore {
    profiles: Mutex<HashMap<UserId, UserProfile>>,
}

impl MemoryUserProfileStore {
    /// Construct an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserProfileStore for MemoryUserProfileStore {
    async fn get(&self, user_id: &UserId) -> StorageResult<Option<UserProfile>> {
        Ok(self.profiles.lock().await.get(user_id).cloned())
    }

    async fn upsert(&self, profile: UserProfile) -> StorageResult<()> {
        self.profiles
            .lock()
            .await
            .insert(profile.user_id.clone(), profile);
        Ok(())
    }

    async fn delete(&self, user_id: &UserId) -> StorageResult<()> {
        self.profiles.lock().await.remove(user_id);
        Ok(())
    }
}

/// In-memory [`McpConfigStore`].
#[derive(Debug, Default)]
pub struct MemoryMcpConfigStore {
    by_user: Mutex<HashMap<UserId, HashMap<String, McpServerConfig>>>,
}

impl MemoryMcpConfigStore {
    /// Construct an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl McpConfigStore for MemoryMcpConfigStore {
    async fn get_user_config(&self, user_id: &UserId) -> StorageResult<Vec<McpServerConfig>> {
        Ok(self
            .by_user
            .lock()
            .await
            .get(user_id)
            .map(|servers| servers.values().cloned().collect())
            .unwrap_or_default())
    }

    async fn save_user_config(
        &self,
        user_id: &UserId,
        servers: Vec<McpServerConfig>,
    ) -> StorageResult<()> {
        let replaced = servers
            .into_iter()
            .map(|s| (s.name.clone(), s))
            .collect::<HashMap<_, _>>();
        self.by_user.lock().await.insert(user_id.clone(), replaced);
        Ok(())
    }

    async fn delete_user_config(&self, user_id: &UserId) -> StorageResult<()> {
        self.by_user.lock().await.remove(user_id);
        Ok(())
    }

    async fn add_server(&self, server: McpServerConfig) -> StorageResult<()> {
        self.by_user
            .lock()
            .await
            .entry(server.user_id.clone())
            .or_default()
            .insert(server.name.clone(), server);
        Ok(())
    }

    async fn remove_server(&self, user_id: &UserId, name: &str) -> StorageResult<()> {
        if let Some(servers) = self.by_user.lock().await.get_mut(user_id) {
            servers.remove(name);
        }
        Ok(())
    }

    async fn get_server(
        &self,
        user_id: &UserId,
        name: &str,
    ) -> StorageResult<Option<McpServerConfig>> {
        Ok(self
            .by_user
            .lock()
            .await
            .get(user_id)
            .and_then(|servers| servers.get(name).cloned()))
    }
}

/// In-memory [`SchemaMigrator`], useful for tests; production deployments
/// use the `SurrealDB`-backed ledger in [`crate::surreal::SurrealSchemaMigrator`].
#[derive(Debug, Default)]
pub struct MemorySchemaMigrator {
    ledger: Mutex<Vec<SchemaVersion>>,
}

impl MemorySchemaMigrator {
    /// Construct an empty ledger.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SchemaMigrator for MemorySchemaMigrator {
    async fn migrate(&self, scripts: &[MigrationScript]) -> StorageResult<Vec<SchemaVersion>> {
        let mut ledger = self.ledger.lock().await;
        let applied_versions: std::collections::HashSet<String> =
            ledger.iter().map(|row| row.version.clone()).collect();
        let mut newly_applied = Vec::new();
        for script in scripts {
            if applied_versions.contains(&script.version) {
                continue;
            }
            // Each script is "one transaction"; the in-memory backend has
            // nothing to roll back, so any statement is trivially atomic.
            let row = SchemaVersion {
                version: script.version.clone(),
                description: script.description.clone(),
                checksum: script.checksum(),
                applied_at: Utc::now(),
                applied_by: "system".to_string(),
            };
            ledger.push(row.clone());
            newly_applied.push(row);
        }
        Ok(newly_applied)
    }

    async fn get_current_version(&self) -> StorageResult<Option<SchemaVersion>> {
        Ok(self.ledger.lock().await.last().cloned())
    }

    async fn rollback(&self, version: &str) -> StorageResult<usize> {
        let mut ledger = self.ledger.lock().await;
        let Some(pos) = ledger.iter().position(|row| row.version == version) else {
            return Err(StorageError::NotFound(format!(
                "schema version {version} not in ledger"
            )));
        };
        let removed = ledger.split_off(pos + 1);
        Ok(removed.len())
    }

    async fn history(&self) -> StorageResult<Vec<SchemaVersion>> {
        Ok(self.ledger.lock().await.clone())
    }
}

/// Convenience bundle of all five in-memory stores, sharing nothing but
/// construction — each store's internal mutex is independent, matching §5's
/// "no cross-store lock acquisition ordering is required".
#[derive(Debug, Default, Clone)]
pub struct MemoryStores {
    /// Session store.
    pub sessions: Arc<MemorySessionStore>,
    /// Message store.
    pub messages: Arc<MemoryMessageStore>,
    /// User profile store.
    pub profiles: Arc<MemoryUserProfileStore>,
    /// MCP config store.
    pub mcp_configs: Arc<MemoryMcpConfigStore>,
}

impl MemoryStores {
    /// Construct an empty bundle.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn session_isolation_across_users() {
        let store = MemorySessionStore::new();
        let alice = UserId::new("alice");
        let bob = UserId::new("bob");
        store.create(alice.clone(), AssistantId::new("a")).await.unwrap();
        store.create(bob.clone(), AssistantId::new("a")).await.unwrap();

        let alice_sessions = store.list_by_user(&alice).await.unwrap();
        assert_eq!(alice_sessions.len(), 1);
        assert_eq!(alice_sessions[0].user_id, alice);
    }

    #[tokio::test]
    async fn delete_does_not_affect_other_users_sessions() {
        let store = MemorySessionStore::new();
        let alice = UserId::new("alice");
        let bob = UserId::new("bob");
        let alice_session = store.create(alice, AssistantId::new("a")).await.unwrap();
        store.create(bob.clone(), AssistantId::new("a")).await.unwrap();

        store.delete(alice_session.session_id).await.unwrap();

        assert_eq!(store.list_by_user(&bob).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn cleanup_expired_removes_only_stale_sessions() {
        let store = MemorySessionStore::new();
        let user = UserId::new("alice");
        let mut fresh = store.create(user.clone(), AssistantId::new("a")).await.unwrap();
        let mut stale = store.create(user.clone(), AssistantId::new("a")).await.unwrap();

        stale.last_active = Utc::now() - chrono::Duration::hours(2);
        store.update(stale.clone()).await.unwrap();
        fresh.last_active = Utc::now();
        store.update(fresh.clone()).await.unwrap();

        let removed = store.cleanup_expired(chrono::Duration::hours(1)).await.unwrap();
        assert_eq!(removed, 1);
        assert!(store.get(stale.session_id).await.unwrap().is_none());
        assert!(store.get(fresh.session_id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn message_pagination_matches_spec_formula() {
        let store = MemoryMessageStore::new();
        let session_id = SessionId::new();
        for i in 0..5 {
            store
                .save_message(session_id, Role::User, format!("msg-{i}"), None)
                .await
                .unwrap();
        }

        let page = store.get_messages(session_id, 2, 3).await.unwrap();
        assert_eq!(page.len(), 2);
        assert_eq!(page[0].content, "msg-3");

        let tail = store.get_messages(session_id, 10, 4).await.unwrap();
        assert_eq!(tail.len(), 1);

        let past_end = store.get_messages(session_id, 10, 10).await.unwrap();
        assert!(past_end.is_empty());
    }

    #[tokio::test]
    async fn message_ordering_matches_insertion_order_on_offset_1_scan() {
        let store = MemoryMessageStore::new();
        let session_id = SessionId::new();
        let mut saved_ids = Vec::new();
        for i in 0..4 {
            let id = store
                .save_message(session_id, Role::User, format!("msg-{i}"), None)
                .await
                .unwrap();
            saved_ids.push(id);
        }

        let mut scanned_ids = Vec::new();
        for offset in 0..4 {
            let page = store.get_messages(session_id, 1, offset).await.unwrap();
            scanned_ids.push(page[0].message_id);
        }
        assert_eq!(scanned_ids, saved_ids);
    }

    #[tokio::test]
    async fn mcp_config_isolation_across_users() {
        let store = MemoryMcpConfigStore::new();
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
    async fn save_user_config_replaces_prior_servers() {
        let store = MemoryMcpConfigStore::new();
        let alice = UserId::new("alice");
        store
            .add_server(McpServerConfig::stdio(alice.clone(), "fs", "npx"))
            .await
            .unwrap();
        store
            .save_user_config(
                &alice,
                vec![McpServerConfig::stdio(alice.clone(), "git", "npx")],
            )
            .await
            .unwrap();

        let servers = store.get_user_config(&alice).await.unwrap();
        assert_eq!(servers.len(), 1);
        assert_eq!(servers[0].name, "git");
    }

    #[tokio::test]
    async fn migrate_is_idempotent() {
        let migrator = MemorySchemaMigrator::new();
        let scripts = vec![MigrationScript {
            version: "0001".to_string(),
            description: "init".to_string(),
            statements: vec!["DEFINE TABLE s_session".to_string()],
        }];

        let first = migrator.migrate(&scripts).await.unwrap();
        assert_eq!(first.len(), 1);
        let second = migrator.migrate(&scripts).await.unwrap();
        assert!(second.is_empty());
        assert_eq!(migrator.history().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn rollback_removes_only_newer_rows() {
        let migrator = MemorySchemaMigrator::new();
        let scripts = vec![
            MigrationScript {
                version: "0001".to_string(),
                description: "init".to_string(),
                statements: vec!["--".to_string()],
            },
            MigrationScript {
                version: "0002".to_string(),
                description: "add column".to_string(),
                statements: vec!["--".to_string()],
            },
        ];
        migrator.migrate(&scripts).await.unwrap();

        let removed = migrator.rollback("0001").await.unwrap();
        assert_eq!(removed, 1);
        assert_eq!(
            migrator.get_current_version().await.unwrap().unwrap().version,
            "0001"
        );
    }
}
