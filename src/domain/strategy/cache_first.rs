//! Cache-first: a hit never touches the network

use tracing::{debug, warn};

use super::StrategyOutcome;
use crate::domain::cache::CachePartition;
use crate::domain::fetch::{FetchRequest, FetchResponse, Fetcher};

/// A cached entry is always considered valid; there is no freshness check.
pub async fn cache_first(
    fetcher: &dyn Fetcher,
    partition: &dyn CachePartition,
    request: &FetchRequest,
) -> StrategyOutcome {
    match partition.match_request(request).await {
        Ok(Some(cached)) => return StrategyOutcome::cache(cached),
        Ok(None) => {}
        Err(e) => {
            warn!(
                partition = partition.name(),
                url = %request.path_and_query(),
                error = %e,
                "Cache lookup failed, treating as miss"
            );
        }
    }

    match fetcher.fetch(request).await {
        Ok(response) => {
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
                url = %request.path_and_query(),
                error = %fetch_error,
                "Image miss while offline"
            );
            StrategyOutcome::synthetic(FetchResponse::image_unavailable())
        }
    }
}
