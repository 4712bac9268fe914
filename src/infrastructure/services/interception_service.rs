//! Handler for every request reaching the edge

use std::sync::Arc;

use tracing::{debug, warn};

use super::LifecycleService;
use crate::domain::cache::CacheStore;
use crate::domain::fetch::{FetchRequest, Fetcher};
use crate::domain::strategy::{self, ResponseSource, Revalidation, Route, StrategyOutcome};
use crate::domain::{DomainError, StrategySelector};
use crate::infrastructure::observability::{record_cache_outcome, record_revalidation};

/// Response to an intercepted request, with how it was produced
#[derive(Debug)]
pub struct Intercepted {
    pub outcome: StrategyOutcome,
    /// `None` when the request bypassed the caching strategies
    pub route: Option<Route>,
}

impl Intercepted {
    fn bypass(outcome: StrategyOutcome) -> Self {
        Self {
            outcome,
            route: None,
        }
    }

    /// Value of the `x-edge-cache` response header
    pub fn cache_status(&self) -> &'static str {
        match (&self.route, self.outcome.source) {
            (None, _) => "bypass",
            (Some(_), ResponseSource::Cache) => "hit",
            (Some(_), ResponseSource::Network) => "miss",
            (Some(_), ResponseSource::Synthetic) => "synthetic",
        }
    }
}

/// Routes requests through the caching strategies once the generation is active
#[derive(Debug)]
pub struct InterceptionService {
    fetcher: Arc<dyn Fetcher>,
    store: Arc<dyn CacheStore>,
    selector: StrategySelector,
    lifecycle: Arc<LifecycleService>,
}

impl InterceptionService {
    pub fn new(
        fetcher: Arc<dyn Fetcher>,
        store: Arc<dyn CacheStore>,
        selector: StrategySelector,
        lifecycle: Arc<LifecycleService>,
    ) -> Self {
        Self {
            fetcher,
            store,
            selector,
            lifecycle,
        }
    }

    pub fn selector(&self) -> &StrategySelector {
        &self.selector
    }

    /// Errors are transport failures on a path with no fallback: a bypassed
    /// request or a cold stale-while-revalidate miss.
    pub async fn handle(&self, request: FetchRequest) -> Result<Intercepted, DomainError> {
        if !request.is_cacheable_method() {
            debug!(method = %request.method(), url = %request.path_and_query(), "Bypassing cache");
            return self.bypass(&request).await;
        }

        if !self.lifecycle.controls_requests().await {
            debug!(url = %request.path_and_query(), "Generation not active, bypassing cache");
            return self.bypass(&request).await;
        }

        let route = self.selector.classify(request.path());
        let partition_name = self.lifecycle.names().name(route.partition);

        let partition = match self.store.open(&partition_name).await {
            Ok(partition) => partition,
            Err(e) => {
                warn!(partition = %partition_name, error = %e, "Cannot open partition, bypassing cache");
                return self.bypass(&request).await;
            }
        };

        debug!(
            url = %request.path_and_query(),
            strategy = %route.strategy,
            partition = %partition_name,
            "Intercepting"
        );

        let mut outcome =
            strategy::execute(route.strategy, Arc::clone(&self.fetcher), partition, request)
                .await?;

        record_cache_outcome(route.strategy.as_str(), outcome.source.as_str());

        if let Some(revalidation) = outcome.revalidation.take() {
            outcome.revalidation = Some(Revalidation::new(tokio::spawn(async move {
                let refreshed = revalidation.settled().await;
                record_revalidation(refreshed);
                refreshed
            })));
        }

        Ok(Intercepted {
            outcome,
            route: Some(route),
        })
    }

    async fn bypass(&self, request: &FetchRequest) -> Result<Intercepted, DomainError> {
        let response = self.fetcher.fetch(request).await?;
        record_cache_outcome("bypass", ResponseSource::Network.as_str());

        Ok(Intercepted::bypass(StrategyOutcome::network(response)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::cache::{CachePartition, PartitionKind, PartitionNames};
    use crate::domain::fetch::{FetchResponse, Scripted, ScriptedFetcher};
    use crate::domain::strategy::StrategyKind;
    use crate::infrastructure::cache::InMemoryCacheStore;
    use crate::infrastructure::services::LifecycleConfig;
    use axum::http::{Method, StatusCode};

    fn ok(body: &'static str) -> FetchResponse {
        FetchResponse::new(StatusCode::OK).with_body(body)
    }

    struct Harness {
        fetcher: Arc<ScriptedFetcher>,
        store: Arc<InMemoryCacheStore>,
        lifecycle: Arc<LifecycleService>,
        service: InterceptionService,
    }

    fn harness(fetcher: ScriptedFetcher, skip_waiting: bool) -> Harness {
        let fetcher = Arc::new(fetcher);
        let store = Arc::new(InMemoryCacheStore::new());
        let lifecycle = Arc::new(LifecycleService::new(
            store.clone(),
            fetcher.clone(),
            LifecycleConfig::default()
                .with_precache_urls(Vec::new())
                .with_skip_waiting(skip_waiting),
        ));
        let service = InterceptionService::new(
            fetcher.clone(),
            store.clone(),
            StrategySelector::default(),
            lifecycle.clone(),
        );

        Harness {
            fetcher,
            store,
            lifecycle,
            service,
        }
    }

    async fn partition_len(store: &InMemoryCacheStore, kind: PartitionKind) -> usize {
        store
            .open(&PartitionNames::default().name(kind))
            .await
            .unwrap()
            .len()
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_api_request_is_network_first() {
        let h = harness(ScriptedFetcher::new().with_response("/api/products", ok("[]")), true);
        h.lifecycle.install().await.unwrap();

        let intercepted = h.service.handle(FetchRequest::get("/api/products")).await.unwrap();

        assert_eq!(
            intercepted.route,
            Some(Route::new(StrategyKind::NetworkFirst, PartitionKind::Dynamic))
        );
        assert_eq!(intercepted.cache_status(), "miss");
        assert_eq!(partition_len(&h.store, PartitionKind::Dynamic).await, 1);
    }

    #[tokio::test]
    async fn test_offline_api_request_is_served_from_cache() {
        let h = harness(ScriptedFetcher::new().with_response("/api/wallet", ok("42")), true);
        h.lifecycle.install().await.unwrap();
        h.service.handle(FetchRequest::get("/api/wallet")).await.unwrap();

        h.fetcher.script("/api/wallet", Scripted::Fail("offline".into()));
        let intercepted = h.service.handle(FetchRequest::get("/api/wallet")).await.unwrap();

        assert_eq!(intercepted.cache_status(), "hit");
        assert_eq!(intercepted.outcome.response, ok("42"));
    }

    #[tokio::test]
    async fn test_missing_image_is_synthetic() {
        let h = harness(ScriptedFetcher::new(), true);
        h.lifecycle.install().await.unwrap();

        let intercepted = h.service.handle(FetchRequest::get("/img/logo.png")).await.unwrap();

        assert_eq!(intercepted.cache_status(), "synthetic");
        assert_eq!(intercepted.outcome.response, FetchResponse::image_unavailable());
    }

    #[tokio::test]
    async fn test_cold_static_miss_while_offline_is_an_error() {
        let h = harness(ScriptedFetcher::new(), true);
        h.lifecycle.install().await.unwrap();

        let error = h
            .service
            .handle(FetchRequest::get("/static/js/app.js"))
            .await
            .unwrap_err();

        assert!(error.is_transport());
    }

    #[tokio::test]
    async fn test_warm_static_hit_revalidates() {
        let h = harness(
            ScriptedFetcher::new().with_response("/static/css/main.css", ok("v1")),
            true,
        );
        h.lifecycle.install().await.unwrap();
        h.service
            .handle(FetchRequest::get("/static/css/main.css"))
            .await
            .unwrap();

        h.fetcher.script("/static/css/main.css", Scripted::Respond(ok("v2")));
        let intercepted = h
            .service
            .handle(FetchRequest::get("/static/css/main.css"))
            .await
            .unwrap();

        assert_eq!(intercepted.cache_status(), "hit");
        assert_eq!(intercepted.outcome.response, ok("v1"));
        assert!(intercepted.outcome.revalidation.unwrap().settled().await);

        let next = h
            .service
            .handle(FetchRequest::get("/static/css/main.css"))
            .await
            .unwrap();
        assert_eq!(next.outcome.response, ok("v2"));
    }

    #[tokio::test]
    async fn test_non_get_bypasses_cache() {
        let h = harness(
            ScriptedFetcher::new().with_response(
                "/api/orders",
                FetchResponse::new(StatusCode::CREATED),
            ),
            true,
        );
        h.lifecycle.install().await.unwrap();

        let intercepted = h
            .service
            .handle(FetchRequest::new(Method::POST, "/api/orders"))
            .await
            .unwrap();

        assert_eq!(intercepted.cache_status(), "bypass");
        assert_eq!(intercepted.outcome.response.status(), StatusCode::CREATED);
        assert_eq!(partition_len(&h.store, PartitionKind::Dynamic).await, 0);
    }

    #[tokio::test]
    async fn test_waiting_generation_does_not_intercept() {
        let h = harness(ScriptedFetcher::new().with_response("/api/products", ok("[]")), false);
        h.lifecycle.install().await.unwrap();

        let intercepted = h.service.handle(FetchRequest::get("/api/products")).await.unwrap();

        assert_eq!(intercepted.cache_status(), "bypass");
        assert_eq!(partition_len(&h.store, PartitionKind::Dynamic).await, 0);

        h.lifecycle.activate().await.unwrap();
        let intercepted = h.service.handle(FetchRequest::get("/api/products")).await.unwrap();
        assert_eq!(intercepted.cache_status(), "miss");
    }

    #[tokio::test]
    async fn test_bypass_transport_failure_is_an_error() {
        let h = harness(ScriptedFetcher::new(), false);

        let result = h.service.handle(FetchRequest::get("/anything")).await;

        assert!(matches!(result, Err(DomainError::Transport { .. })));
    }
}
