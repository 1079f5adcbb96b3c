//! HTTP middleware

use axum::{
    body::Body,
    http::{Request, StatusCode},
    middleware::Next,
    response::Response,
};
use tracing::{debug, warn};

/// Request logging middleware
pub async fn log_request(req: Request<Body>, next: Next) -> Result<Response, StatusCode> {
    let method = req.method().clone();
    let path = req.uri().path().to_string();
    let start = std::time::Instant::now();

    let response = next.run(req).await;

    let status = response.status();
    let elapsed_us = start.elapsed().as_micros() as u64;
    if status.is_client_error() || status.is_server_error() {
        warn!(%method, %path, status = status.as_u16(), elapsed_us, "Request rejected");
    } else {
        debug!(%method, %path, status = status.as_u16(), elapsed_us, "Request completed");
    }

    Ok(response)
}
