//! dataagent-storage — persistence layer for session, message, user
//! profile, and MCP config state (C2–C5), plus the schema migration
//! ledger (C12).
//!
//! Two peer backends implement the same [`traits`] (§9, "Capability-shaped
//! stores" — neither is a subclass of the other):
//!
//! - [`memory`] — in-memory reference implementations, one mutex per store.
//! - [`surreal`] — `SurrealDB`-backed implementations sharing one
//!   [`Database`] connection.
//!
//! A factory (`dataagent-config`'s `StorageBackend`) chooses one at
//! startup.

#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod db;
pub mod error;
pub mod memory;
pub mod surreal;
pub mod traits;

pub use db::Database;
pub use error::{StorageError, StorageResult};
pub use memory::{
    MemoryMcpConfigStore, MemoryMessageStore, MemorySchemaMigrator, MemorySessionStore,
    MemoryStores, MemoryUserProfileStore,
};
pub use surreal::{
    SurrealMcpConfigStore, SurrealMessageStore, SurrealSchemaMigrator, SurrealSessionStore,
    SurrealUserProfileStore,
};
pub use traits::{
    McpConfigStore, MessageStore, MigrationScript, SchemaMigrator, SessionStore, UserProfileStore,
};
