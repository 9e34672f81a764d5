//! The HITL decision type (C9), shared between the connection manager, the
//! HITL handler, and the streaming dispatcher.

use serde::{Deserialize, Serialize};

/// A client's answer to a `hitl_request`, or the handler's own synthesized
/// rejection on timeout/cancellation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Decision {
    /// The action is approved; execution proceeds.
    Approve {
        /// Optional note from the approver.
        message: Option<String>,
    },
    /// The action is rejected; execution does not proceed.
    Reject {
        /// Reason for rejection (always populated for synthesized rejections).
        message: Option<String>,
    },
}

impl Decision {
    /// The message shown in the "automatically rejected" timeout-path, per §4.8.
    pub const TIMEOUT_MESSAGE: &'static str = "Approval timeout - automatically rejected";

    /// A synthesized rejection carrying `reason`.
    #[must_use]
    pub fn reject(reason: impl Into<String>) -> Self {
        Self::Reject {
            message: Some(reason.into()),
        }
    }

    /// The timeout-path rejection (§4.8 step 5).
    #[must_use]
    pub fn timeout_rejection() -> Self {
        Self::reject(Self::TIMEOUT_MESSAGE)
    }

    /// Whether this decision approves the action.
    #[must_use]
    pub fn is_approved(&self) -> bool {
        matches!(self, Self::Approve { .. })
    }
}
