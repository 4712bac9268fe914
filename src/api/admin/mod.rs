//! Admin API endpoints for inspecting and managing the edge cache

pub mod cache;
pub mod classify;
pub mod lifecycle;

use axum::{
    routing::{delete, get, post},
    Router,
};

use super::state::AppState;

/// Create admin API router
pub fn create_admin_router() -> Router<AppState> {
    Router::new()
        // Partitions
        .route("/cache/partitions", get(cache::list_partitions))
        .route("/cache/partitions/{name}", delete(cache::delete_partition))
        .route("/cache/purge", post(cache::purge))
        // Lifecycle
        .route("/lifecycle", get(lifecycle::get_lifecycle))
        .route("/lifecycle/activate", post(lifecycle::activate))
        // Classification
        .route("/classify", get(classify::classify))
}
