use axum::extract::{Json, Path, Query, State};
use axum::http::StatusCode;
use contracts::domain::{
    CancelOrderRequest, CreateOrderRequest, CreateOrderResponse, OrderStatistics, OrderView,
    UpdateOrderStatusRequest,
};
use contracts::shared::{ApiResponse, Pagination};
use serde::Deserialize;

use crate::domain::order::service;
use crate::shared::error::ApiError;
use crate::shared::state::AppState;

const DEFAULT_PAGE_SIZE: u64 = 10;

#[derive(Debug, Deserialize)]
pub struct PageQuery {
    pub limit: Option<u64>,
    pub offset: Option<u64>,
}

/// POST /api/orders
pub async fn create(
    State(state): State<AppState>,
    Json(request): Json<CreateOrderRequest>,
) -> Result<(StatusCode, Json<ApiResponse<CreateOrderResponse>>), ApiError> {
    let created = service::create_order(&state.db, request).await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::with_message("Order created successfully", created)),
    ))
}

/// GET /api/orders/user/:userId (authenticated)
pub async fn list_for_user(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    Query(page): Query<PageQuery>,
) -> Result<Json<ApiResponse<Vec<OrderView>>>, ApiError> {
    let limit = page.limit.unwrap_or(DEFAULT_PAGE_SIZE);
    let offset = page.offset.unwrap_or(0);
    let (orders, total) = service::list_for_user(&state.db, &user_id, limit, offset).await?;
    let has_more = orders.len() as u64 == limit;
    Ok(Json(ApiResponse::page(
        orders,
        Pagination {
            total,
            limit,
            offset,
            has_more,
        },
    )))
}

/// GET /api/orders/:orderNumber
pub async fn get_by_number(
    State(state): State<AppState>,
    Path(order_number): Path<String>,
) -> Result<Json<ApiResponse<OrderView>>, ApiError> {
    let order = service::get_order(&state.db, &order_number).await?;
    Ok(Json(ApiResponse::ok(order)))
}

/// PUT /api/orders/:orderNumber/status (admin)
pub async fn update_status(
    State(state): State<AppState>,
    Path(order_number): Path<String>,
    Json(request): Json<UpdateOrderStatusRequest>,
) -> Result<Json<ApiResponse<OrderView>>, ApiError> {
    let order = service::update_status(&state.db, &order_number, request).await?;
    Ok(Json(ApiResponse::with_message(
        "Order status updated successfully",
        order,
    )))
}

/// POST /api/orders/:orderNumber/cancel
///
/// The body is optional; a bare POST cancels with the default reason.
pub async fn cancel(
    State(state): State<AppState>,
    Path(order_number): Path<String>,
    request: Option<Json<CancelOrderRequest>>,
) -> Result<Json<ApiResponse<()>>, ApiError> {
    let request = request.map(|Json(r)| r).unwrap_or_default();
    service::cancel_order(&state.db, &order_number, request).await?;
    Ok(Json(ApiResponse::message("Order cancelled successfully")))
}

/// GET /api/orders/stats/overview (admin)
pub async fn statistics(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<OrderStatistics>>, ApiError> {
    let stats = service::statistics(&state.db).await?;
    Ok(Json(ApiResponse::ok(stats)))
}
