//! Worker generation status and manual activation

use axum::extract::State;
use tracing::info;

use crate::api::middleware::RequireAdmin;
use crate::api::state::AppState;
use crate::api::types::{ApiError, Json};
use crate::domain::LifecycleStatus;

/// GET /admin/lifecycle
pub async fn get_lifecycle(
    State(state): State<AppState>,
    _: RequireAdmin,
) -> Json<LifecycleStatus> {
    Json(state.lifecycle.status().await)
}

/// POST /admin/lifecycle/activate
///
/// Activates a generation that installed without skip-waiting.
pub async fn activate(
    State(state): State<AppState>,
    _: RequireAdmin,
) -> Result<Json<LifecycleStatus>, ApiError> {
    let status = state.lifecycle.activate().await?;

    info!(version = %status.version, "Admin activated generation");
    Ok(Json(status))
}
