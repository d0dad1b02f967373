use axum::extract::{Json, Path, State};
use axum::http::StatusCode;
use contracts::domain::{Band, BandInput};
use contracts::shared::ApiResponse;
use serde_json::{json, Value};

use crate::domain::band::service;
use crate::shared::error::ApiError;
use crate::shared::state::AppState;

/// GET /api/bands
pub async fn list(State(state): State<AppState>) -> Result<Json<ApiResponse<Vec<Band>>>, ApiError> {
    let bands = service::list(&state.db).await?;
    let count = bands.len();
    Ok(Json(ApiResponse::list(bands, count)))
}

/// GET /api/bands/featured
pub async fn featured(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Vec<Band>>>, ApiError> {
    let bands = service::featured(&state.db).await?;
    Ok(Json(ApiResponse::ok(bands)))
}

/// GET /api/bands/:id
pub async fn get_by_id(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<Band>>, ApiError> {
    let band = service::get(&state.db, &id).await?;
    Ok(Json(ApiResponse::ok(band)))
}

/// GET /api/bands/category/:category
///
/// Echoes the requested category alongside the page, so responses stay
/// self-describing when the storefront fires several filters at once.
pub async fn by_category(
    State(state): State<AppState>,
    Path(category): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let bands = service::by_category(&state.db, &category).await?;
    let count = bands.len();
    Ok(Json(json!({
        "success": true,
        "data": bands,
        "count": count,
        "category": category,
    })))
}

/// GET /api/bands/compatible/:size
pub async fn compatible(
    State(state): State<AppState>,
    Path(size): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let bands = service::compatible_with(&state.db, &size).await?;
    let count = bands.len();
    Ok(Json(json!({
        "success": true,
        "data": bands,
        "count": count,
        "compatibleWith": size,
    })))
}

/// GET /api/bands/search/:query
pub async fn search(
    State(state): State<AppState>,
    Path(query): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let bands = service::search(&state.db, &query).await?;
    let count = bands.len();
    Ok(Json(json!({
        "success": true,
        "data": bands,
        "count": count,
        "searchQuery": query,
    })))
}

/// POST /api/bands (admin)
pub async fn create(
    State(state): State<AppState>,
    Json(input): Json<BandInput>,
) -> Result<(StatusCode, Json<ApiResponse<Band>>), ApiError> {
    let band = service::create(&state.db, input).await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::with_message("Band created successfully", band)),
    ))
}

/// PUT /api/bands/:id (admin)
pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(input): Json<BandInput>,
) -> Result<Json<ApiResponse<Band>>, ApiError> {
    let band = service::update(&state.db, &id, input).await?;
    Ok(Json(ApiResponse::with_message(
        "Band updated successfully",
        band,
    )))
}

/// DELETE /api/bands/:id (admin)
pub async fn delete(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<()>>, ApiError> {
    service::delete(&state.db, &id).await?;
    Ok(Json(ApiResponse::message("Band deleted successfully")))
}
