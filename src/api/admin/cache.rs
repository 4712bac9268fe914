//! Partition inspection and cleanup

use axum::{
    extract::{Path, State},
    http::StatusCode,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::api::middleware::RequireAdmin;
use crate::api::state::AppState;
use crate::api::types::{ApiError, Json};
use crate::domain::cache::PartitionKind;

/// One partition as reported by the admin API
#[derive(Debug, Clone, Serialize)]
pub struct PartitionSummary {
    pub name: String,
    pub entries: usize,
    /// Belongs to the running generation
    pub current: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind: Option<PartitionKind>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ListPartitionsResponse {
    pub partitions: Vec<PartitionSummary>,
    pub total: usize,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PurgeRequest {
    /// Partitions to delete; stale generations when absent
    #[serde(default)]
    pub partitions: Option<Vec<String>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PurgeResponse {
    pub purged: Vec<String>,
}

/// GET /admin/cache/partitions
pub async fn list_partitions(
    State(state): State<AppState>,
    _: RequireAdmin,
) -> Result<Json<ListPartitionsResponse>, ApiError> {
    debug!("Admin listing partitions");

    let names = state.lifecycle.names();
    let mut partitions = Vec::new();

    for name in state.store.names().await? {
        let entries = state.store.count(&name).await?;

        partitions.push(PartitionSummary {
            current: names.is_current(&name),
            kind: names.kind_of(&name),
            name,
            entries,
        });
    }

    let total = partitions.len();

    Ok(Json(ListPartitionsResponse { partitions, total }))
}

/// DELETE /admin/cache/partitions/{name}
pub async fn delete_partition(
    State(state): State<AppState>,
    _: RequireAdmin,
    Path(name): Path<String>,
) -> Result<StatusCode, ApiError> {
    if !state.store.delete(&name).await? {
        return Err(ApiError::not_found(format!("Partition '{}' not found", name)));
    }

    info!(partition = %name, "Admin deleted partition");
    Ok(StatusCode::NO_CONTENT)
}

/// POST /admin/cache/purge
pub async fn purge(
    State(state): State<AppState>,
    _: RequireAdmin,
    Json(request): Json<PurgeRequest>,
) -> Result<Json<PurgeResponse>, ApiError> {
    let purged = match request.partitions {
        Some(names) => {
            let mut purged = Vec::new();

            for name in names {
                if state.store.delete(&name).await? {
                    purged.push(name);
                }
            }

            purged
        }
        None => state.lifecycle.purge_stale().await?,
    };

    info!(count = purged.len(), "Admin purged partitions");
    Ok(Json(PurgeResponse { purged }))
}
