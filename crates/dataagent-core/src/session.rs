//! Session data type (part of C2/C13's data model, §3).

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::ids::{AssistantId, SessionId, UserId};

/// Per-user, per-assistant container for one or more turns.
///
/// `user_id` is immutable after creation. `state` and `metadata` are opaque
/// maps the session store never interprets; `last_active` is touched
/// explicitly (`update` itself does *not* implicitly touch it — see
/// `dataagent-session`'s session manager for the one call site that does).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    /// Unique session identifier.
    pub session_id: SessionId,
    /// Owning user. Immutable after creation.
    pub user_id: UserId,
    /// Assistant this session is bound to.
    pub assistant_id: AssistantId,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Last time the session was touched by a turn or explicit keep-alive.
    pub last_active: DateTime<Utc>,
    /// Opaque, store-agnostic state (e.g. loaded-memory flag, git state).
    #[serde(default)]
    pub state: HashMap<String, Value>,
    /// Opaque caller metadata.
    #[serde(default)]
    pub metadata: HashMap<String, Value>,
}

impl Session {
    /// Create a new session with `created_at = last_active = now`.
    #[must_use]
    pub fn new(user_id: UserId, assistant_id: AssistantId) -> Self {
        let now = Utc::now();
        Self {
            session_id: SessionId::new(),
            user_id,
            assistant_id,
            created_at: now,
            last_active: now,
            state: HashMap::new(),
            metadata: HashMap::new(),
        }
    }

    /// Whether the session has been inactive longer than `timeout`.
    #[must_use]
    pub fn is_expired(&self, timeout: chrono::Duration, now: DateTime<Utc>) -> bool {
        now - self.last_active > timeout
    }

    /// Touch `last_active` to `now`.
    pub fn touch(&mut self, now: DateTime<Utc>) {
        self.last_active = now;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_session_is_not_expired_immediately() {
        let session = Session::new(UserId::new("alice"), AssistantId::new("default"));
        assert!(!session.is_expired(chrono::Duration::seconds(1), Utc::now()));
    }

    #[test]
    fn expiry_is_relative_to_last_active_not_created_at() {
        let mut session = Session::new(UserId::new("alice"), AssistantId::new("default"));
        let later = session.created_at + chrono::Duration::hours(2);
        session.touch(later);
        assert!(!session.is_expired(chrono::Duration::hours(1), later + chrono::Duration::minutes(30)));
    }
}
