//! Network-first: live data, then cache, then `503 Offline`

use tracing::{debug, warn};

use super::StrategyOutcome;
use crate::domain::cache::CachePartition;
use crate::domain::fetch::{FetchRequest, FetchResponse, Fetcher};

/// Never fails: the caller always gets a response.
pub async fn network_first(
    fetcher: &dyn Fetcher,
    partition: &dyn CachePartition,
    request: &FetchRequest,
) -> StrategyOutcome {
    match fetcher.fetch(request).await {
        Ok(response) => {
            // Error bodies are passed through but never stored
            if response.is_success() {
                if let Err(e) = partition.put(request, response.clone()).await {
                    warn!(
                        partition = partition.name(),
                        url = %request.path_and_query(),
                        error = %e,
                        "Failed to store network response"
                    );
                }
            }

            StrategyOutcome::network(response)
        }
        Err(fetch_error) => {
            debug!(
                partition = partition.name(),
                url = %request.path_and_query(),
                error = %fetch_error,
                "Network unavailable, falling back to cache"
            );

            match partition.match_request(request).await {
                Ok(Some(cached)) => StrategyOutcome::cache(cached),
                Ok(None) => StrategyOutcome::synthetic(FetchResponse::offline()),
                Err(e) => {
                    warn!(
                        partition = partition.name(),
                        url = %request.path_and_query(),
                        error = %e,
                        "Cache lookup failed after network failure"
                    );
                    StrategyOutcome::synthetic(FetchResponse::offline())
                }
            }
        }
    }
}
