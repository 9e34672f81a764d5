//! dataagent-core — foundation types for the dataagent conversational-agent
//! service.
//!
//! This crate provides:
//! - The event model (C1): tagged event variants with lossless map encoding
//! - The `Session`, `Message`, `UserProfile`, `McpServerConfig`, `Rule`, and
//!   `SchemaVersion` data types (§3)
//! - The `AgentExecutor` trait boundary consumed by the streaming dispatcher
//! - Identifier newtypes (`SessionId`, `MessageId`, `UserId`, `AssistantId`)

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]

pub mod decision;
pub mod error;
pub mod event;
pub mod executor;
pub mod ids;
pub mod mcp_config;
pub mod message;
pub mod rule;
pub mod schema_version;
pub mod session;
pub mod user_profile;

pub use decision::Decision;
pub use error::{CoreError, CoreResult};
pub use event::{ActionRequest, Event, EventDecodeError, EventKind, OutcomeStatus};
pub use executor::{AgentConfig, AgentExecutor, TurnInput, TurnOutcome};
pub use ids::{AssistantId, MessageId, SessionId, UserId};
pub use mcp_config::{McpServerConfig, Transport, UserMcpConfig};
pub use message::{Message, Role};
pub use rule::{InclusionMode, Rule, Scope};
pub use schema_version::SchemaVersion;
pub use session::Session;
pub use user_profile::UserProfile;
