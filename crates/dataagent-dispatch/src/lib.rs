#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
//! Streaming turn dispatcher (C11) for dataagent.
//!
//! Drives one user turn end to end: persists the user message, pulls
//! [`dataagent_core::executor::AgentExecutor`] events, forwards them over
//! the session's live channel via [`dataagent_session::ConnectionManager`],
//! persists the terminal assistant message, and suspends for
//! [`dataagent_hitl::HitlCoordinator`] approval on `hitl_request` events.
//!
//! Cancellation has two layers (§5): [`Dispatcher::cancel_turn`] asks the
//! executor to unwind cooperatively via
//! [`dataagent_core::executor::AgentExecutor::cancel`]; the connection
//! manager's `cancel_task`/`disconnect` abort remains a coarser backstop for
//! a turn that never responds.

/// Error types for the streaming dispatcher.
pub mod error;

/// The turn loop itself (C11).
pub mod dispatcher;

pub use dispatcher::Dispatcher;
pub use error::{DispatchError, DispatchResult};
