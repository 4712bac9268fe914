//! Fallback handler: every request not served by the edge's own endpoints

use axum::{
    body::{to_bytes, Body},
    extract::{Request, State},
    http::{HeaderName, HeaderValue},
    response::Response,
};

use crate::api::state::AppState;
use crate::api::types::ApiError;
use crate::domain::FetchRequest;
use crate::infrastructure::services::Intercepted;

/// `hit`, `miss`, `synthetic` or `bypass`
pub const EDGE_CACHE_HEADER: &str = "x-edge-cache";
/// Strategy that answered the request; absent on bypass
pub const EDGE_STRATEGY_HEADER: &str = "x-edge-strategy";

/// Largest request body forwarded upstream
const MAX_BODY_BYTES: usize = 10 * 1024 * 1024;

pub async fn intercept(
    State(state): State<AppState>,
    request: Request,
) -> Result<Response, ApiError> {
    let (parts, body) = request.into_parts();

    let body = to_bytes(body, MAX_BODY_BYTES)
        .await
        .map_err(|e| ApiError::bad_request(format!("Failed to read request body: {}", e)))?;

    let path_and_query = parts
        .uri
        .path_and_query()
        .map(|pq| pq.as_str())
        .unwrap_or("/");

    let fetch_request = FetchRequest::new(parts.method, path_and_query)
        .with_headers(parts.headers)
        .with_body(body);

    let intercepted = state.interception.handle(fetch_request).await?;

    Ok(into_response(intercepted))
}

fn into_response(intercepted: Intercepted) -> Response {
    let cache_status = intercepted.cache_status();
    let strategy = intercepted.route.map(|route| route.strategy.as_str());
    let (status, headers, body) = intercepted.outcome.response.into_parts();

    let mut response = Response::new(Body::from(body));
    *response.status_mut() = status;
    *response.headers_mut() = headers;

    let response_headers = response.headers_mut();
    response_headers.insert(
        HeaderName::from_static(EDGE_CACHE_HEADER),
        HeaderValue::from_static(cache_status),
    );

    if let Some(strategy) = strategy {
        response_headers.insert(
            HeaderName::from_static(EDGE_STRATEGY_HEADER),
            HeaderValue::from_static(strategy),
        );
    }

    response
}
