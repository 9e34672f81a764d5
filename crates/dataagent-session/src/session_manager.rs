//! Session manager (§4.12 C13): owns the session store and runs the
//! background expiry loop.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use dataagent_core::ids::{AssistantId, SessionId, UserId};
use dataagent_core::session::Session;
use dataagent_storage::StorageResult;
use dataagent_storage::traits::SessionStore;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::info;

/// Owns the session store and, when started, a background cleanup loop.
pub struct SessionManager {
    store: Arc<dyn SessionStore>,
    session_timeout: chrono::Duration,
    cleanup_interval: Duration,
    loop_handle: Mutex<Option<JoinHandle<()>>>,
    running: Arc<AtomicBool>,
}

impl SessionManager {
    /// Build a manager over `store` with the given idle timeout and
    /// background sweep period.
    #[must_use]
    pub fn new(store: Arc<dyn SessionStore>, session_timeout: chrono::Duration, cleanup_interval: Duration) -> Self {
        Self {
            store,
            session_timeout,
            cleanup_interval,
            loop_handle: Mutex::new(None),
            running: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Start the background expiry loop. Idempotent: a second call while
    /// already running is a no-op.
    pub async fn start(self: &Arc<Self>) {
        let mut handle_slot = self.loop_handle.lock().await;
        if handle_slot.is_some() {
            return;
        }
        self.running.store(true, Ordering::SeqCst);
        let this = self.clone();
        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(this.cleanup_interval);
            ticker.tick().await; // first tick fires immediately; skip it
            loop {
                ticker.tick().await;
                if !this.running.load(Ordering::SeqCst) {
                    break;
                }
                match this.store.cleanup_expired(this.session_timeout).await {
                    Ok(count) if count > 0 => info!(count, "expired sessions cleaned up"),
                    Ok(_) => {},
                    Err(err) => tracing::warn!(%err, "session cleanup sweep failed"),
                }
            }
        });
        *handle_slot = Some(handle);
    }

    /// Stop the background loop, awaiting its exit. Idempotent.
    pub async fn stop(&self) {
        self.running.store(false, Ordering::SeqCst);
        let mut handle_slot = self.loop_handle.lock().await;
        if let Some(handle) = handle_slot.take() {
            handle.abort();
            let _ = handle.await;
        }
    }

    /// Get an existing session by id, touching and returning it if present
    /// and not expired; create and return a new one otherwise.
    ///
    /// # Errors
    /// Propagates store errors.
    pub async fn get_or_create_session(
        &self,
        user_id: UserId,
        assistant_id: AssistantId,
        session_id: Option<SessionId>,
    ) -> StorageResult<Session> {
        if let Some(id) = session_id {
            if let Some(mut session) = self.get_session(id).await? {
                session.touch(chrono::Utc::now());
                self.store.update(session.clone()).await?;
                return Ok(session);
            }
        }
        self.store.create(user_id, assistant_id).await
    }

    /// Fetch a session by id. If found but expired, delete it and return
    /// `None` instead.
    ///
    /// # Errors
    /// Propagates store errors.
    pub async fn get_session(&self, id: SessionId) -> StorageResult<Option<Session>> {
        let Some(session) = self.store.get(id.clone()).await? else {
            return Ok(None);
        };
        if session.is_expired(self.session_timeout, chrono::Utc::now()) {
            self.store.delete(id).await?;
            return Ok(None);
        }
        Ok(Some(session))
    }

    /// List a user's sessions, sorted by `last_active` descending.
    ///
    /// # Errors
    /// Propagates store errors.
    pub async fn list_by_user(&self, user_id: &UserId) -> StorageResult<Vec<Session>> {
        self.store.list_by_user(user_id).await
    }

    /// Delete a session by id. No-op (not an error) if absent.
    ///
    /// # Errors
    /// Propagates store errors.
    pub async fn delete_session(&self, id: SessionId) -> StorageResult<()> {
        self.store.delete(id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dataagent_storage::MemorySessionStore;

    fn manager() -> Arc<SessionManager> {
        Arc::new(SessionManager::new(
            Arc::new(MemorySessionStore::new()),
            chrono::Duration::seconds(3600),
            Duration::from_millis(20),
        ))
    }

    #[tokio::test]
    async fn get_or_create_with_no_id_always_creates() {
        let mgr = manager();
        let session = mgr
            .get_or_create_session(UserId::new("u1"), AssistantId::new("a1"), None)
            .await
            .unwrap();
        assert_eq!(session.user_id, UserId::new("u1"));
    }

    #[tokio::test]
    async fn get_or_create_with_known_id_touches_and_returns() {
        let mgr = manager();
        let created = mgr
            .get_or_create_session(UserId::new("u1"), AssistantId::new("a1"), None)
            .await
            .unwrap();
        let fetched = mgr
            .get_or_create_session(UserId::new("u1"), AssistantId::new("a1"), Some(created.session_id.clone()))
            .await
            .unwrap();
        assert_eq!(fetched.session_id, created.session_id);
        assert!(fetched.last_active >= created.last_active);
    }

    #[tokio::test]
    async fn expired_session_is_deleted_on_get() {
        let mgr = manager();
        let mut created = mgr
            .get_or_create_session(UserId::new("u1"), AssistantId::new("a1"), None)
            .await
            .unwrap();
        created.last_active = chrono::Utc::now() - chrono::Duration::hours(2);
        mgr.store.update(created.clone()).await.unwrap();

        let fetched = mgr.get_session(created.session_id.clone()).await.unwrap();
        assert!(fetched.is_none());
        assert!(mgr.store.get(created.session_id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn start_and_stop_are_idempotent() {
        let mgr = manager();
        mgr.start().await;
        mgr.start().await;
        mgr.stop().await;
        mgr.stop().await;
    }
}
