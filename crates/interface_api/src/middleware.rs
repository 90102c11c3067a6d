//! API middleware

use axum::{body::Body, http::Request, middleware::Next, response::Response};
use chrono::Utc;
use tracing::info;

/// Header naming the user on whose behalf a request is made
pub const ACTOR_HEADER: &str = "x-actor";

/// Header carrying the per-request id set by the request-id layer
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Audit logging middleware
///
/// Logs all API requests for compliance and debugging
pub async fn audit_middleware(request: Request<Body>, next: Next) -> Response {
    let method = request.method().clone();
    let uri = request.uri().clone();
    let actor = header_value(&request, ACTOR_HEADER).unwrap_or_else(|| "anonymous".to_string());
    let request_id = header_value(&request, REQUEST_ID_HEADER).unwrap_or_default();

    let start = Utc::now();

    let response = next.run(request).await;

    let duration = Utc::now() - start;
    let status = response.status();

    info!(
        method = %method,
        uri = %uri,
        actor = %actor,
        request_id = %request_id,
        status = %status.as_u16(),
        duration_ms = duration.num_milliseconds(),
        "API request"
    );

    response
}

fn header_value(request: &Request<Body>, name: &str) -> Option<String> {
    request
        .headers()
        .get(name)
        .and_then(|h| h.to_str().ok())
        .map(str::to_string)
}
