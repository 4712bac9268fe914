//! Stale-while-revalidate: answer from cache now, refresh it for next time

use std::sync::Arc;

use tracing::{debug, warn};

use super::{Revalidation, StrategyOutcome};
use crate::domain::cache::CachePartition;
use crate::domain::fetch::{FetchRequest, Fetcher};
use crate::domain::DomainError;

/// The network fetch is spawned before the cache lookup is awaited, so it is
/// never delayed behind it.
///
/// - Warm cache: the cached response is returned at once. The fetch keeps
///   running detached; a success overwrites the entry, a failure is dropped.
/// - Cold cache: the caller waits for the fetch. A transport failure is
///   returned as `Err`; there is no placeholder response on this path.
pub async fn stale_while_revalidate(
    fetcher: Arc<dyn Fetcher>,
    partition: Arc<dyn CachePartition>,
    request: FetchRequest,
) -> Result<StrategyOutcome, DomainError> {
    let refresh = {
        let partition = Arc::clone(&partition);
        let request = request.clone();

        tokio::spawn(async move {
            let response = fetcher.fetch(&request).await?;

            if response.is_success() {
                if let Err(e) = partition.put(&request, response.clone()).await {
                    warn!(
                        partition = partition.name(),
                        url = %request.path_and_query(),
                        error = %e,
                        "Failed to store revalidated response"
                    );
                }
            }

            Ok::<_, DomainError>(response)
        })
    };

    let cached = match partition.match_request(&request).await {
        Ok(cached) => cached,
        Err(e) => {
            warn!(
                partition = partition.name(),
                url = %request.path_and_query(),
                error = %e,
                "Cache lookup failed, waiting for network"
            );
            None
        }
    };

    match cached {
        Some(cached) => {
            let url = request.path_and_query();
            let settle = tokio::spawn(async move {
                match refresh.await {
                    Ok(Ok(response)) => {
                        debug!(url = %url, status = %response.status(), "Revalidated");
                        true
                    }
                    Ok(Err(e)) => {
                        debug!(url = %url, error = %e, "Revalidation failed, keeping cached copy");
                        false
                    }
                    Err(e) => {
                        warn!(url = %url, error = %e, "Revalidation task did not complete");
                        false
                    }
                }
            });

            Ok(StrategyOutcome::cache(cached).with_revalidation(Revalidation::new(settle)))
        }
        None => {
            let response = refresh
                .await
                .map_err(|e| DomainError::internal(format!("Fetch task failed: {}", e)))??;

            Ok(StrategyOutcome::network(response))
        }
    }
}
