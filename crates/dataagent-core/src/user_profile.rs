//! User profile data type (C4's data model, §3).

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::ids::UserId;

/// A user's profile.
///
/// `user_id` is immutable. `email` is designated **sensitive**: callers
/// composing a system prompt (the rule engine, the memory loader) must never
/// include it — see `dataagent-rules`'s prompt assembly, which only reads
/// `username`/`display_name`/`department`/`role`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    /// Primary key. Immutable after creation.
    pub user_id: UserId,
    /// Login/handle name.
    pub username: String,
    /// Human-friendly display name.
    pub display_name: String,
    /// Sensitive. Never surfaced in a system prompt.
    pub email: Option<String>,
    /// Organizational department, if known.
    pub department: Option<String>,
    /// Organizational role, if known.
    pub role: Option<String>,
    /// Opaque caller-defined fields.
    #[serde(default)]
    pub custom_fields: HashMap<String, Value>,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Last update time.
    pub updated_at: DateTime<Utc>,
}

impl UserProfile {
    /// Create a profile with sensible defaults for optional fields.
    #[must_use]
    pub fn new(user_id: UserId, username: impl Into<String>) -> Self {
        let now = Utc::now();
        let username = username.into();
        Self {
            user_id,
            display_name: username.clone(),
            username,
            email: None,
            department: None,
            role: None,
            custom_fields: HashMap::new(),
            created_at: now,
            updated_at: now,
        }
    }
}
