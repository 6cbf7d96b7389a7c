use std::time::Instant;

use axum::{extract::Request, http::StatusCode, middleware::Next, response::Response};
use tracing::info;

use crate::context::operator_from_headers;

/// Reject requests without a gateway identity; attach the
/// [`OperatorContext`](plantops_core::OperatorContext) otherwise.
pub async fn operator_context_middleware(mut req: Request, next: Next) -> Result<Response, StatusCode> {
    let ctx = operator_from_headers(req.headers()).ok_or(StatusCode::UNAUTHORIZED)?;
    req.extensions_mut().insert(ctx);
    Ok(next.run(req).await)
}

/// One log line per request.
pub async fn request_log_middleware(req: Request, next: Next) -> Response {
    let method = req.method().clone();
    let path = req.uri().path().to_string();
    let started = Instant::now();

    let res = next.run(req).await;

    info!(
        method = %method,
        path = %path,
        status = res.status().as_u16(),
        elapsed_ms = started.elapsed().as_millis() as u64,
        "request"
    );
    res
}
