//! Schema migration ledger row (C12's data model, §3).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One applied-migration record in the append-only ledger.
///
/// Never updated in place; `rollback` removes rows newer than a target
/// version but never edits a historical checksum.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchemaVersion {
    /// The migration's version identifier (e.g. `"0007_add_mcp_headers"`).
    pub version: String,
    /// Human-readable description of what the migration does.
    pub description: String,
    /// Content checksum of the migration script, recorded at apply time.
    pub checksum: String,
    /// When the migration was applied.
    pub applied_at: DateTime<Utc>,
    /// Who/what applied it (operator id or `"system"`).
    pub applied_by: String,
}
