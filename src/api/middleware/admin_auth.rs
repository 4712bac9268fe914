//! Admin authentication
//!
//! The admin API is guarded by a single bearer token from configuration.
//! Only its SHA-256 digest is kept in memory.

use axum::{
    extract::FromRequestParts,
    http::{header, request::Parts, HeaderMap},
};
use sha2::{Digest, Sha256};
use tracing::{debug, warn};

use crate::api::state::AppState;
use crate::api::types::ApiError;

/// Digest of the configured admin token
pub struct AdminToken {
    digest: String,
}

impl std::fmt::Debug for AdminToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdminToken").field("digest", &"[REDACTED]").finish()
    }
}

impl AdminToken {
    pub fn new(token: &str) -> Self {
        Self {
            digest: hash_token(token),
        }
    }

    pub fn verify(&self, candidate: &str) -> bool {
        constant_time_compare(&hash_token(candidate), &self.digest)
    }
}

fn hash_token(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    hex::encode(hasher.finalize())
}

/// Constant-time string comparison to prevent timing attacks
fn constant_time_compare(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }

    a.bytes()
        .zip(b.bytes())
        .fold(0u8, |acc, (x, y)| acc | (x ^ y))
        == 0
}

/// Extractor that requires the admin bearer token
#[derive(Debug, Clone, Copy)]
pub struct RequireAdmin;

impl FromRequestParts<AppState> for RequireAdmin {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let Some(expected) = &state.admin_token else {
            return Err(ApiError::not_found("Admin API is disabled"));
        };

        let presented = extract_bearer_token(&parts.headers)?;

        if !expected.verify(&presented) {
            warn!("Rejected admin request with invalid token");
            return Err(ApiError::unauthorized("Invalid admin token"));
        }

        debug!("Admin access granted");
        Ok(RequireAdmin)
    }
}

fn extract_bearer_token(headers: &HeaderMap) -> Result<String, ApiError> {
    let auth_header = headers.get(header::AUTHORIZATION).ok_or_else(|| {
        ApiError::unauthorized("Admin token required. Provide via 'Authorization: Bearer <token>'")
    })?;

    let auth_str = auth_header
        .to_str()
        .map_err(|_| ApiError::bad_request("Invalid Authorization header encoding"))?;

    auth_str
        .strip_prefix("Bearer ")
        .map(|token| token.trim().to_string())
        .ok_or_else(|| ApiError::unauthorized("Authorization header must use the Bearer scheme"))
}
