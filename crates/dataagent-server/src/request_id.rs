//! Request correlation middleware (§6): every response carries
//! `X-Request-ID`. If the inbound request supplies one, it is echoed back
//! unchanged; otherwise a fresh UUID is minted.
//!
//! Grounded in [`dataagent_telemetry::RequestContext`]: rather than holding
//! its `RequestGuard` across an `.await` (its inner `tracing::span::Entered`
//! is `!Send`), the request future is wrapped with `Instrument::instrument`
//! using the context's span.

use axum::extract::Request;
use axum::http::{HeaderName, HeaderValue};
use axum::middleware::Next;
use axum::response::Response;
use dataagent_telemetry::RequestContext;
use tracing::Instrument;

const REQUEST_ID_HEADER: HeaderName = HeaderName::from_static("x-request-id");

/// Axum middleware implementing the X-Request-ID correlation contract.
pub async fn request_id_middleware(mut request: Request, next: Next) -> Response {
    let incoming = request
        .headers()
        .get(&REQUEST_ID_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string);

    let mut ctx = RequestContext::new("dataagent-server").with_operation(request.uri().path());
    if let Some(id) = incoming {
        ctx = ctx.with_request_id(id);
    }
    let request_id = ctx.request_id().to_string();

    request
        .extensions_mut()
        .insert(request_id.clone());

    let span = ctx.span();
    let mut response = next.run(request).instrument(span).await;

    if let Ok(value) = HeaderValue::from_str(&request_id) {
        response.headers_mut().insert(REQUEST_ID_HEADER, value);
    }
    response
}
