use axum::extract::{Json, State};
use contracts::dashboards::AdminOverview;
use contracts::shared::ApiResponse;

use crate::dashboards::overview::service;
use crate::shared::error::ApiError;
use crate::shared::state::AppState;

/// GET /api/admin/stats (admin)
pub async fn stats(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<AdminOverview>>, ApiError> {
    let snapshot = service::overview(&state.db).await?;
    Ok(Json(ApiResponse::ok(snapshot)))
}
