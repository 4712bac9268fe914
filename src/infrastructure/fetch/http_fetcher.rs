//! Upstream fetcher using reqwest

use std::time::Duration;

use async_trait::async_trait;
use axum::http::{header, HeaderMap, HeaderName};
use tracing::debug;

use crate::domain::fetch::{FetchRequest, FetchResponse, Fetcher};
use crate::domain::DomainError;

/// Headers scoped to a single connection; never forwarded in either direction
static HOP_BY_HOP: [HeaderName; 9] = [
    header::CONNECTION,
    HeaderName::from_static("keep-alive"),
    header::PROXY_AUTHENTICATE,
    header::PROXY_AUTHORIZATION,
    header::TE,
    header::TRAILER,
    header::TRANSFER_ENCODING,
    header::UPGRADE,
    header::HOST,
];

/// Configuration for the upstream fetcher
#[derive(Debug, Clone)]
pub struct HttpFetcherConfig {
    /// Origin every request path is resolved against (e.g., "http://127.0.0.1:3000")
    pub base_url: String,
    pub timeout: Duration,
}

impl HttpFetcherConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            timeout: Duration::from_secs(30),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Forwards requests to the origin server
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
    base_url: String,
}

impl HttpFetcher {
    pub fn new(config: HttpFetcherConfig) -> Result<Self, DomainError> {
        let base_url = config.base_url.trim_end_matches('/').to_string();

        if base_url.is_empty() {
            return Err(DomainError::configuration("Upstream base URL cannot be empty"));
        }

        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| DomainError::configuration(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self { client, base_url })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url_for(&self, request: &FetchRequest) -> String {
        format!("{}{}", self.base_url, request.path_and_query())
    }
}

fn strip_hop_by_hop(headers: &HeaderMap) -> HeaderMap {
    let mut forwarded = headers.clone();

    for name in &HOP_BY_HOP {
        forwarded.remove(name);
    }

    forwarded
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, request: &FetchRequest) -> Result<FetchResponse, DomainError> {
        let url = self.url_for(request);

        let response = self
            .client
            .request(request.method().clone(), &url)
            .headers(strip_hop_by_hop(request.headers()))
            .body(request.body().clone())
            .send()
            .await
            .map_err(|e| DomainError::transport(format!("{} {}: {}", request.method(), url, e)))?;

        let status = response.status();
        let mut headers = strip_hop_by_hop(response.headers());
        // The body is buffered; the server recomputes the length
        headers.remove(header::CONTENT_LENGTH);

        let body = response
            .bytes()
            .await
            .map_err(|e| DomainError::transport(format!("Failed to read body of {}: {}", url, e)))?;

        debug!(url = %url, status = %status, bytes = body.len(), "Upstream response");

        Ok(FetchResponse::new(status).with_headers(headers).with_body(body))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{HeaderValue, Method, StatusCode};
    use wiremock::matchers::{body_string, header as header_eq, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn fetcher_for(server: &MockServer) -> HttpFetcher {
        HttpFetcher::new(HttpFetcherConfig::new(server.uri())).unwrap()
    }

    #[test]
    fn test_empty_base_url_is_rejected() {
        let result = HttpFetcher::new(HttpFetcherConfig::new("/"));
        assert!(matches!(result, Err(DomainError::Configuration { .. })));
    }

    #[tokio::test]
    async fn test_fetch_forwards_path_query_and_headers() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/api/products"))
            .and(query_param("page", "2"))
            .and(header_eq("accept", "application/json"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("x-origin", "brillprime")
                    .set_body_string("[]"),
            )
            .expect(1)
            .mount(&server)
            .await;

        let request = FetchRequest::get("/api/products?page=2")
            .with_header(header::ACCEPT, HeaderValue::from_static("application/json"));

        let response = fetcher_for(&server).fetch(&request).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.body().as_ref(), b"[]");
        assert_eq!(response.headers()["x-origin"], "brillprime");
        assert!(response.headers().get(header::CONTENT_LENGTH).is_none());
    }

    #[tokio::test]
    async fn test_error_status_is_a_response() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/api/missing"))
            .respond_with(ResponseTemplate::new(404).set_body_string("nope"))
            .mount(&server)
            .await;

        let response = fetcher_for(&server)
            .fetch(&FetchRequest::get("/api/missing"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(response.body().as_ref(), b"nope");
    }

    #[tokio::test]
    async fn test_forwards_method_and_body() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/api/orders"))
            .and(body_string("{\"qty\":1}"))
            .respond_with(ResponseTemplate::new(201))
            .expect(1)
            .mount(&server)
            .await;

        let request = FetchRequest::new(Method::POST, "/api/orders").with_body("{\"qty\":1}");
        let response = fetcher_for(&server).fetch(&request).await.unwrap();

        assert_eq!(response.status(), StatusCode::CREATED);
    }

    #[tokio::test]
    async fn test_timeout_is_a_transport_error() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(5)))
            .mount(&server)
            .await;

        let fetcher = HttpFetcher::new(
            HttpFetcherConfig::new(server.uri()).with_timeout(Duration::from_millis(100)),
        )
        .unwrap();

        let error = fetcher.fetch(&FetchRequest::get("/slow")).await.unwrap_err();
        assert!(error.is_transport());
    }

    #[tokio::test]
    async fn test_unreachable_origin_is_a_transport_error() {
        let fetcher = HttpFetcher::new(
            HttpFetcherConfig::new("http://127.0.0.1:1").with_timeout(Duration::from_secs(2)),
        )
        .unwrap();

        let error = fetcher.fetch(&FetchRequest::get("/")).await.unwrap_err();
        assert!(error.is_transport());
    }

    #[test]
    fn test_strip_hop_by_hop() {
        let mut headers = HeaderMap::new();
        headers.insert(header::CONNECTION, HeaderValue::from_static("keep-alive"));
        headers.insert(header::TRANSFER_ENCODING, HeaderValue::from_static("chunked"));
        headers.insert(header::HOST, HeaderValue::from_static("edge.local"));
        headers.insert(header::ACCEPT, HeaderValue::from_static("*/*"));

        let stripped = strip_hop_by_hop(&headers);

        assert_eq!(stripped.len(), 1);
        assert!(stripped.contains_key(header::ACCEPT));
    }
}
