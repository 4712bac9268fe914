//! Request classification and the three caching strategies

mod cache_first;
mod network_first;
mod outcome;
mod selector;
mod stale_while_revalidate;

use std::sync::Arc;

pub use cache_first::cache_first;
pub use network_first::network_first;
pub use outcome::{ResponseSource, Revalidation, StrategyOutcome};
pub use selector::{Route, RoutingRules, StrategyKind, StrategySelector};
pub use stale_while_revalidate::stale_while_revalidate;

use crate::domain::cache::CachePartition;
use crate::domain::fetch::{FetchRequest, Fetcher};
use crate::domain::DomainError;

/// Runs one strategy. Only a cold stale-while-revalidate miss can fail.
pub async fn execute(
    kind: StrategyKind,
    fetcher: Arc<dyn Fetcher>,
    partition: Arc<dyn CachePartition>,
    request: FetchRequest,
) -> Result<StrategyOutcome, DomainError> {
    match kind {
        StrategyKind::NetworkFirst => {
            Ok(network_first(fetcher.as_ref(), partition.as_ref(), &request).await)
        }
        StrategyKind::CacheFirst => {
            Ok(cache_first(fetcher.as_ref(), partition.as_ref(), &request).await)
        }
        StrategyKind::StaleWhileRevalidate => {
            stale_while_revalidate(fetcher, partition, request).await
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::cache::MockPartition;
    use crate::domain::fetch::{FetchResponse, ScriptedFetcher};
    use axum::http::StatusCode;

    #[tokio::test]
    async fn test_execute_dispatches_each_kind() {
        let fetcher: Arc<dyn Fetcher> = Arc::new(ScriptedFetcher::new().with_failure("/x", "offline"));

        let network = execute(
            StrategyKind::NetworkFirst,
            fetcher.clone(),
            Arc::new(MockPartition::new("d")),
            FetchRequest::get("/x"),
        )
        .await
        .unwrap();
        assert_eq!(network.response, FetchResponse::offline());

        let cache = execute(
            StrategyKind::CacheFirst,
            fetcher.clone(),
            Arc::new(MockPartition::new("i")),
            FetchRequest::get("/x"),
        )
        .await
        .unwrap();
        assert_eq!(cache.response.status(), StatusCode::NOT_FOUND);

        let swr = execute(
            StrategyKind::StaleWhileRevalidate,
            fetcher,
            Arc::new(MockPartition::new("s")),
            FetchRequest::get("/x"),
        )
        .await;
        assert!(swr.is_err());
    }
}
