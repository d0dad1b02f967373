use axum::extract::{Json, Path, State};
use axum::http::StatusCode;
use contracts::domain::{Watch, WatchCompatibility, WatchInput};
use contracts::shared::ApiResponse;
use serde_json::{json, Value};

use crate::domain::watch::service;
use crate::shared::error::ApiError;
use crate::shared::state::AppState;

/// GET /api/watches
pub async fn list(State(state): State<AppState>) -> Result<Json<ApiResponse<Vec<Watch>>>, ApiError> {
    let watches = service::list(&state.db).await?;
    let count = watches.len();
    Ok(Json(ApiResponse::list(watches, count)))
}

/// GET /api/watches/:id
pub async fn get_by_id(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<Watch>>, ApiError> {
    let watch = service::get(&state.db, &id).await?;
    Ok(Json(ApiResponse::ok(watch)))
}

/// GET /api/watches/series/:series
pub async fn by_series(
    State(state): State<AppState>,
    Path(series): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let watches = service::by_series(&state.db, &series).await?;
    let count = watches.len();
    Ok(Json(json!({
        "success": true,
        "data": watches,
        "count": count,
        "series": series,
    })))
}

/// GET /api/watches/:id/compatibility
pub async fn compatibility(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<WatchCompatibility>>, ApiError> {
    let info = service::compatibility(&state.db, &id).await?;
    Ok(Json(ApiResponse::ok(info)))
}

/// GET /api/watches/compare/:ids
pub async fn compare(
    State(state): State<AppState>,
    Path(ids): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let comparison = service::compare(&state.db, &ids).await?;
    let count = comparison.watches.len();
    Ok(Json(json!({
        "success": true,
        "data": comparison,
        "count": count,
    })))
}

/// POST /api/watches (admin)
pub async fn create(
    State(state): State<AppState>,
    Json(input): Json<WatchInput>,
) -> Result<(StatusCode, Json<ApiResponse<Watch>>), ApiError> {
    let watch = service::create(&state.db, input).await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::with_message("Watch created successfully", watch)),
    ))
}

/// PUT /api/watches/:id (admin)
pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(input): Json<WatchInput>,
) -> Result<Json<ApiResponse<Watch>>, ApiError> {
    let watch = service::update(&state.db, &id, input).await?;
    Ok(Json(ApiResponse::with_message(
        "Watch updated successfully",
        watch,
    )))
}
