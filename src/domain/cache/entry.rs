//! Cached request/response pairs and their matching rules

use chrono::{DateTime, Utc};

use crate::domain::fetch::{FetchRequest, FetchResponse};

/// A stored response together with what is needed to match it against later requests
#[derive(Debug, Clone)]
pub struct CachedEntry {
    key: String,
    /// Request header values captured for every name in the response's `Vary`
    vary: Vec<(String, Option<String>)>,
    response: FetchResponse,
    stored_at: DateTime<Utc>,
}

impl CachedEntry {
    pub fn new(request: &FetchRequest, response: FetchResponse) -> Self {
        let vary = response
            .vary_headers()
            .into_iter()
            .map(|name| {
                let value = request.header(&name).map(str::to_string);
                (name, value)
            })
            .collect();

        Self {
            key: request.cache_key(),
            vary,
            response,
            stored_at: Utc::now(),
        }
    }

    /// Rebuilds an entry loaded from a persistent backend
    pub fn restore(
        key: String,
        vary: Vec<(String, Option<String>)>,
        response: FetchResponse,
        stored_at: DateTime<Utc>,
    ) -> Self {
        Self {
            key,
            vary,
            response,
            stored_at,
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn vary(&self) -> &[(String, Option<String>)] {
        &self.vary
    }

    pub fn response(&self) -> &FetchResponse {
        &self.response
    }

    pub fn stored_at(&self) -> DateTime<Utc> {
        self.stored_at
    }

    pub fn into_response(self) -> FetchResponse {
        self.response
    }

    /// Same key, and every varied header carries the value it had when stored.
    /// `Vary: *` never matches.
    pub fn matches(&self, request: &FetchRequest) -> bool {
        if request.cache_key() != self.key {
            return false;
        }

        self.vary.iter().all(|(name, stored)| {
            name != "*" && request.header(name) == stored.as_deref()
        })
    }
}
