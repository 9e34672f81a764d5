//! Request correlation across session, HITL, MCP, and storage operations.
//!
//! [`RequestContext`] carries the `X-Request-ID` correlation id (§6,
//! "Request correlation") through a tracing span so every log line for one
//! inbound request — streaming turn, one-shot chat call, or HITL decision
//! delivery — can be grepped back together.

use tracing::Span;
use tracing::span::EnteredSpan;
use uuid::Uuid;

/// Correlates log output with one inbound request.
#[derive(Debug, Clone)]
pub struct RequestContext {
    request_id: String,
    component: &'static str,
    operation: Option<String>,
}

impl RequestContext {
    /// Start a context for `component`, minting a fresh request id.
    ///
    /// Use [`RequestContext::with_request_id`] instead when the caller
    /// already carries an `X-Request-ID` header to propagate.
    #[must_use]
    pub fn new(component: &'static str) -> Self {
        Self {
            request_id: Uuid::new_v4().to_string(),
            component,
            operation: None,
        }
    }

    /// Attach the operation name (e.g. `"send_turn"`, `"resolve_decision"`).
    #[must_use]
    pub fn with_operation(mut self, operation: impl Into<String>) -> Self {
        self.operation = Some(operation.into());
        self
    }

    /// Override the request id with one propagated from an inbound header.
    #[must_use]
    pub fn with_request_id(mut self, request_id: impl Into<String>) -> Self {
        self.request_id = request_id.into();
        self
    }

    /// The correlation id, suitable for echoing back as `X-Request-ID`.
    #[must_use]
    pub fn request_id(&self) -> &str {
        &self.request_id
    }

    /// Build (but do not enter) the tracing span for this context.
    #[must_use]
    pub fn span(&self) -> Span {
        tracing::info_span!(
            "request",
            request_id = %self.request_id,
            component = %self.component,
            operation = self.operation.as_deref().unwrap_or(""),
        )
    }

    /// Enter this context's span for the lifetime of the returned guard.
    #[must_use]
    pub fn enter(&self) -> RequestGuard {
        RequestGuard {
            _entered: self.span().entered(),
        }
    }
}

/// Holds an entered [`RequestContext`] span. Dropping it exits the span.
pub struct RequestGuard {
    _entered: EnteredSpan,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn propagated_request_id_is_preserved() {
        let ctx = RequestContext::new("dataagent-server").with_request_id("req-123");
        assert_eq!(ctx.request_id(), "req-123");
    }

    #[test]
    fn fresh_contexts_mint_distinct_ids() {
        let a = RequestContext::new("dataagent-server");
        let b = RequestContext::new("dataagent-server");
        assert_ne!(a.request_id(), b.request_id());
    }

    #[test]
    fn enter_scopes_the_span() {
        let ctx = RequestContext::new("dataagent-server").with_operation("send_turn");
        let _guard = ctx.enter();
        tracing::info!("inside scoped span");
    }
}
