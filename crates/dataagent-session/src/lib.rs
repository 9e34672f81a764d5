#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
//! Connection manager (C10) and session manager (C13) for dataagent.
//!
//! Grounded in the teacher's gateway session registry: one mutex over the
//! channel/task maps, a per-session cancellable task, a background expiry
//! sweep. The connection manager implements [`dataagent_hitl::EventSink`] so
//! [`dataagent_hitl::HitlCoordinator`] can deliver `hitl_request` events
//! over a session's live channel without either crate depending on the
//! transport layer.

/// The per-session channel/task multiplexer (C10).
pub mod connection;
/// Connection/session manager error types.
pub mod error;
/// The session store owner and background expiry loop (C13).
pub mod session_manager;

pub use connection::{Channel, ConnectionManager};
pub use error::{SessionError, SessionResult};
pub use session_manager::SessionManager;
