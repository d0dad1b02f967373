use axum::extract::{Json, Path, Query, State};
use contracts::domain::{
    AddToCartRequest, AddToCartResponse, CartOwner, CartView, ClearCartRequest, MergeCartRequest,
    UpdateCartItemRequest,
};
use contracts::shared::ApiResponse;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::domain::cart::service;
use crate::shared::error::ApiError;
use crate::shared::state::AppState;

#[derive(Debug, Deserialize)]
pub struct OwnerQuery {
    #[serde(rename = "userId")]
    pub user_id: Option<String>,
    #[serde(rename = "sessionId")]
    pub session_id: Option<String>,
}

/// GET /api/cart?userId=...&sessionId=...
pub async fn get_cart(
    State(state): State<AppState>,
    Query(query): Query<OwnerQuery>,
) -> Result<Json<ApiResponse<CartView>>, ApiError> {
    let owner = CartOwner::from_ids(query.user_id, query.session_id)
        .ok_or_else(|| ApiError::validation("User ID or Session ID is required"))?;
    let cart = service::get_cart(&state.db, &owner).await?;
    Ok(Json(ApiResponse::ok(cart)))
}

/// POST /api/cart/add
pub async fn add_item(
    State(state): State<AppState>,
    Json(request): Json<AddToCartRequest>,
) -> Result<Json<ApiResponse<AddToCartResponse>>, ApiError> {
    let cart = service::add_item(&state.db, request).await?;
    Ok(Json(ApiResponse::with_message("Item added to cart", cart)))
}

/// PUT /api/cart/update
pub async fn update_item(
    State(state): State<AppState>,
    Json(request): Json<UpdateCartItemRequest>,
) -> Result<Json<ApiResponse<()>>, ApiError> {
    let removed = service::update_item(&state.db, request).await?;
    let message = if removed {
        "Item removed from cart"
    } else {
        "Cart updated successfully"
    };
    Ok(Json(ApiResponse::message(message)))
}

/// DELETE /api/cart/remove/:cartItemId
pub async fn remove_item(
    State(state): State<AppState>,
    Path(cart_item_id): Path<String>,
) -> Result<Json<ApiResponse<()>>, ApiError> {
    service::remove_item(&state.db, &cart_item_id).await?;
    Ok(Json(ApiResponse::message("Item removed from cart")))
}

/// POST /api/cart/clear
pub async fn clear(
    State(state): State<AppState>,
    Json(request): Json<ClearCartRequest>,
) -> Result<Json<ApiResponse<()>>, ApiError> {
    service::clear(&state.db, request).await?;
    Ok(Json(ApiResponse::message("Cart cleared successfully")))
}

/// POST /api/cart/merge
pub async fn merge(
    State(state): State<AppState>,
    Json(request): Json<MergeCartRequest>,
) -> Result<Json<ApiResponse<Value>>, ApiError> {
    match service::merge(&state.db, request).await? {
        Some(user_cart_id) => Ok(Json(ApiResponse::with_message(
            "Cart merged successfully",
            json!({ "userCartId": user_cart_id }),
        ))),
        None => Ok(Json(ApiResponse::message("No guest cart to merge"))),
    }
}
