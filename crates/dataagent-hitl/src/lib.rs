//! dataagent-hitl — the human-in-the-loop approval handler (C9).
//!
//! A per-session, single-slot rendezvous: a tool call pauses, emits a
//! `hitl_request` event, and waits for a client decision, a timeout, or a
//! disconnect. See [`HitlCoordinator`] for the full contract (§4.8).
//!
//! Adapted from the teacher's allowance/deferred-queue approval manager
//! (`manager.rs`), simplified to the spec's narrower single-slot semantics
//! — there is no allowance store or deferred resolution queue here.

#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]

pub mod coordinator;
pub mod error;
pub mod sink;

pub use coordinator::{DEFAULT_HITL_TIMEOUT, HitlCoordinator};
pub use error::{HitlError, HitlResult};
pub use sink::EventSink;
