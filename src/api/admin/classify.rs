//! Dry-run of request classification

use axum::extract::{Query, State};
use serde::{Deserialize, Serialize};

use crate::api::middleware::RequireAdmin;
use crate::api::state::AppState;
use crate::api::types::{ApiError, Json};
use crate::domain::cache::PartitionKind;
use crate::domain::StrategyKind;

#[derive(Debug, Deserialize)]
pub struct ClassifyQuery {
    pub path: String,
}

#[derive(Debug, Serialize)]
pub struct ClassifyResponse {
    pub path: String,
    pub strategy: StrategyKind,
    pub partition_kind: PartitionKind,
    pub partition: String,
}

/// GET /admin/classify?path=
pub async fn classify(
    State(state): State<AppState>,
    _: RequireAdmin,
    Query(query): Query<ClassifyQuery>,
) -> Result<Json<ClassifyResponse>, ApiError> {
    if query.path.is_empty() {
        return Err(ApiError::bad_request("path must not be empty"));
    }

    let route = state.interception.selector().classify(&query.path);

    Ok(Json(ClassifyResponse {
        partition: state.lifecycle.names().name(route.partition),
        path: query.path,
        strategy: route.strategy,
        partition_kind: route.partition,
    }))
}
