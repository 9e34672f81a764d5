//! Message data type (C3's data model, §3).

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::ids::{MessageId, SessionId};

/// The role a message was authored in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Authored by the end user.
    User,
    /// Authored by the assistant.
    Assistant,
    /// A system-level instruction.
    System,
    /// A tool's result, surfaced as a message.
    Tool,
}

/// An append-only message within a session.
///
/// Ordering within a session is `created_at` ascending, ties broken by
/// insertion order; the store is responsible for preserving that tie-break
/// since two messages saved in the same millisecond must still come back in
/// save order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    /// Unique message identifier, assigned on save.
    pub message_id: MessageId,
    /// The session this message belongs to.
    pub session_id: SessionId,
    /// Who authored the message.
    pub role: Role,
    /// The message body.
    pub content: String,
    /// When the message was saved.
    pub created_at: DateTime<Utc>,
    /// Opaque metadata (e.g. tool call ids, token counts).
    #[serde(default)]
    pub metadata: HashMap<String, Value>,
    /// Monotonically increasing per-store insertion sequence, used only to
    /// break ties when two messages share a `created_at` timestamp. Not
    /// part of the public contract — callers order by `created_at` and rely
    /// on the store to apply this as a secondary key.
    #[serde(default)]
    pub(crate) sequence: u64,
}

impl Message {
    /// Build a message with a fresh id, to be assigned a `created_at` and
    /// `sequence` by the store on save.
    #[must_use]
    pub fn new(session_id: SessionId, role: Role, content: impl Into<String>) -> Self {
        Self {
            message_id: MessageId::new(),
            session_id,
            role,
            content: content.into(),
            created_at: Utc::now(),
            metadata: HashMap::new(),
            sequence: 0,
        }
    }
}
