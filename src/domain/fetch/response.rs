use axum::http::{header, HeaderMap, HeaderName, HeaderValue, StatusCode};
use bytes::Bytes;

/// Body of the synthetic response returned by network-first when nothing else is available
pub const OFFLINE_BODY: &str = "Offline";

/// Body of the synthetic response returned by cache-first when an image cannot be fetched
pub const IMAGE_UNAVAILABLE_BODY: &str = "Image not available";

/// A response snapshot: status, headers and the full body
///
/// Cloning is cheap (the body is reference counted), so strategies store a
/// clone and hand the original back to the caller.
#[derive(Debug, Clone, PartialEq)]
pub struct FetchResponse {
    status: StatusCode,
    headers: HeaderMap,
    body: Bytes,
}

impl FetchResponse {
    pub fn new(status: StatusCode) -> Self {
        Self {
            status,
            headers: HeaderMap::new(),
            body: Bytes::new(),
        }
    }

    /// Plain-text response with the given status
    pub fn text(status: StatusCode, body: &'static str) -> Self {
        Self::new(status)
            .with_header(
                header::CONTENT_TYPE,
                HeaderValue::from_static("text/plain"),
            )
            .with_body(Bytes::from_static(body.as_bytes()))
    }

    /// Synthetic `503 Offline`
    pub fn offline() -> Self {
        Self::text(StatusCode::SERVICE_UNAVAILABLE, OFFLINE_BODY)
    }

    /// Synthetic `404 Image not available`
    pub fn image_unavailable() -> Self {
        Self::text(StatusCode::NOT_FOUND, IMAGE_UNAVAILABLE_BODY)
    }

    pub fn with_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    pub fn with_headers(mut self, headers: HeaderMap) -> Self {
        self.headers = headers;
        self
    }

    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn body(&self) -> &Bytes {
        &self.body
    }

    /// 2xx, the same test the platform's `Response.ok` applies
    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    /// Lower-cased header names listed in `Vary`
    pub fn vary_headers(&self) -> Vec<String> {
        self.headers
            .get_all(header::VARY)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .flat_map(|v| v.split(','))
            .map(|name| name.trim().to_ascii_lowercase())
            .filter(|name| !name.is_empty())
            .collect()
    }

    pub fn into_parts(self) -> (StatusCode, HeaderMap, Bytes) {
        (self.status, self.headers, self.body)
    }
}
