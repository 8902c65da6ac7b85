// CORS and request logging middleware

use axum::{extract::Request, middleware::Next, response::Response};
use std::time::Instant;
use tower_http::cors::{Any, CorsLayer};

/// Request logging middleware
///
/// Tags each request with a short id and logs method, path, status and
/// handling time once the response is ready.
pub async fn request_logging(request: Request, next: Next) -> Response {
    let request_id = uuid::Uuid::new_v4().to_string()[..8].to_string();
    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let started = Instant::now();

    tracing::debug!("[{}] --> {} {}", request_id, method, path);

    let response = next.run(request).await;

    let status = response.status();
    let elapsed_ms = started.elapsed().as_secs_f64() * 1000.0;
    if status.is_server_error() {
        tracing::warn!(
            "[{}] <-- {} {} {} ({:.1}ms)",
            request_id,
            method,
            path,
            status.as_u16(),
            elapsed_ms
        );
    } else {
        tracing::info!(
            "[{}] <-- {} {} {} ({:.1}ms)",
            request_id,
            method,
            path,
            status.as_u16(),
            elapsed_ms
        );
    }

    response
}

/// Create CORS middleware layer
///
/// The dashboard may be served from another origin, so any origin, method
/// and header is allowed. OPTIONS preflight is answered automatically.
pub fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any)
        .expose_headers(Any)
}
