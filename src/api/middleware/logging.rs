//! Access log for the edge
//!
//! One line when a request arrives and one when it is answered, the latter
//! carrying the `x-edge-cache` and `x-edge-strategy` values set by the proxy.

use std::time::Instant;

use axum::{
    body::Body,
    http::{HeaderMap, Request},
    middleware::Next,
    response::Response,
};
use tracing::info;

use crate::api::proxy::{EDGE_CACHE_HEADER, EDGE_STRATEGY_HEADER};

/// Request headers that influence caching or identify the client
const LOGGED_HEADERS: [&str; 6] = [
    "accept",
    "cache-control",
    "if-none-match",
    "range",
    "user-agent",
    "authorization",
];

/// Logged by presence only
const REDACTED_HEADERS: [&str; 1] = ["authorization"];

pub async fn logging_middleware(request: Request<Body>, next: Next) -> Response {
    let start = Instant::now();
    let method = request.method().clone();
    let uri = request.uri().clone();
    let request_id = request_id(request.headers());

    info!(
        method = %method,
        uri = %uri,
        request_id = %request_id,
        headers = %loggable_headers(request.headers()),
        "Incoming request"
    );

    let response = next.run(request).await;

    info!(
        method = %method,
        uri = %uri,
        status = response.status().as_u16(),
        cache = header_or_dash(response.headers(), EDGE_CACHE_HEADER),
        strategy = header_or_dash(response.headers(), EDGE_STRATEGY_HEADER),
        duration_ms = start.elapsed().as_millis() as u64,
        request_id = %request_id,
        "Request completed"
    );

    response
}

fn request_id(headers: &HeaderMap) -> String {
    headers
        .get("x-request-id")
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
        .unwrap_or_else(|| uuid::Uuid::new_v4().to_string())
}

fn header_or_dash<'a>(headers: &'a HeaderMap, name: &str) -> &'a str {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("-")
}

fn loggable_headers(headers: &HeaderMap) -> String {
    LOGGED_HEADERS
        .iter()
        .filter_map(|name| {
            let value = headers.get(*name)?;

            let value = if REDACTED_HEADERS.contains(name) {
                "[REDACTED]"
            } else {
                value.to_str().unwrap_or("[invalid]")
            };

            Some(format!("{}={}", name, value))
        })
        .collect::<Vec<_>>()
        .join(", ")
}
