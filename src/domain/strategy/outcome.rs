use serde::Serialize;
use tokio::task::JoinHandle;

use crate::domain::fetch::FetchResponse;

/// Where the response handed to the caller came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseSource {
    Network,
    Cache,
    /// Fabricated placeholder (`503 Offline`, `404 Image not available`)
    Synthetic,
}

impl ResponseSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResponseSource::Network => "network",
            ResponseSource::Cache => "cache",
            ResponseSource::Synthetic => "synthetic",
        }
    }
}

/// Handle to a detached background refresh
///
/// Dropping it does not cancel the refresh.
#[derive(Debug)]
pub struct Revalidation {
    handle: JoinHandle<bool>,
}

impl Revalidation {
    pub(crate) fn new(handle: JoinHandle<bool>) -> Self {
        Self { handle }
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Waits until the refresh has stored its result or given up.
    /// Returns whether a fresh response reached the network.
    pub async fn settled(self) -> bool {
        self.handle.await.unwrap_or(false)
    }
}

/// Result of running a strategy for one request
#[derive(Debug)]
pub struct StrategyOutcome {
    pub response: FetchResponse,
    pub source: ResponseSource,
    pub revalidation: Option<Revalidation>,
}

impl StrategyOutcome {
    pub fn network(response: FetchResponse) -> Self {
        Self::from_source(response, ResponseSource::Network)
    }

    pub fn cache(response: FetchResponse) -> Self {
        Self::from_source(response, ResponseSource::Cache)
    }

    pub fn synthetic(response: FetchResponse) -> Self {
        Self::from_source(response, ResponseSource::Synthetic)
    }

    fn from_source(response: FetchResponse, source: ResponseSource) -> Self {
        Self {
            response,
            source,
            revalidation: None,
        }
    }

    pub fn with_revalidation(mut self, revalidation: Revalidation) -> Self {
        self.revalidation = Some(revalidation);
        self
    }
}
