//! BrillPrime Edge
//!
//! Offline-first caching edge for the BrillPrime web app. Requests are
//! classified by URL and answered network-first, cache-first or
//! stale-while-revalidate from versioned cache partitions.

pub mod api;
pub mod cli;
pub mod config;
pub mod domain;
pub mod infrastructure;

pub use config::AppConfig;

use std::sync::Arc;

use api::state::AppState;
use domain::{Fetcher, StrategySelector};
use infrastructure::cache::CacheStoreFactory;
use infrastructure::fetch::HttpFetcher;
use infrastructure::services::{InterceptionService, LifecycleService};
use tracing::info;

/// Create the application state with all services initialized
pub async fn create_app_state() -> anyhow::Result<AppState> {
    create_app_state_with_config(&AppConfig::default()).await
}

/// Create the application state with custom configuration
///
/// Nothing is installed yet: callers run `state.lifecycle.install()`.
pub async fn create_app_state_with_config(config: &AppConfig) -> anyhow::Result<AppState> {
    let fetcher: Arc<dyn Fetcher> = Arc::new(HttpFetcher::new(config.fetcher_config())?);
    info!(upstream = %config.upstream.base_url, "Upstream configured");

    let store = CacheStoreFactory::new()
        .create(&config.cache_store_config())
        .await?;
    info!(backend = %config.cache.backend, "Cache store ready");

    let lifecycle = Arc::new(LifecycleService::new(
        store.clone(),
        fetcher.clone(),
        config.lifecycle_config()?,
    ));

    let interception = Arc::new(InterceptionService::new(
        fetcher,
        store.clone(),
        StrategySelector::new(config.routing.clone()),
        lifecycle.clone(),
    ));

    let state = AppState::new(interception, lifecycle, store);

    match config.admin_token() {
        Some(token) => Ok(state.with_admin_token(token)),
        None => {
            info!("Admin API disabled (no admin.token configured)");
            Ok(state)
        }
    }
}
