use axum::http::StatusCode;
use axum::{
    middleware,
    routing::{delete, get, post, put},
    Json, Router,
};
use contracts::shared::ApiResponse;

use crate::handlers;
use crate::shared::state::AppState;
use crate::system;

/// Unmatched paths answer in the same envelope as everything else.
async fn not_found() -> (StatusCode, Json<ApiResponse<()>>) {
    (
        StatusCode::NOT_FOUND,
        Json(ApiResponse::error("Endpoint not found")),
    )
}

/// All application routes with their access layers.
///
/// Admin routes check the shared X-Admin-Key header; account routes check
/// the bearer token. Everything else is public, carts included, so guests
/// can shop and check out without an account.
pub fn configure_routes(state: AppState) -> Router {
    let require_auth =
        middleware::from_fn_with_state(state.clone(), system::auth::middleware::require_auth);
    let require_admin =
        middleware::from_fn_with_state(state.clone(), system::auth::middleware::require_admin);

    Router::new()
        .route("/api/health", get(handlers::health::health))
        // ========================================
        // AUTH ROUTES
        // ========================================
        .route("/api/auth/register", post(system::handlers::auth::register))
        .route("/api/auth/login", post(system::handlers::auth::login))
        .route("/api/auth/apple", post(system::handlers::auth::apple_login))
        .route(
            "/api/auth/forgot-password",
            post(system::handlers::auth::forgot_password),
        )
        .route(
            "/api/auth/reset-password",
            post(system::handlers::auth::reset_password),
        )
        // Account routes (bearer token)
        .route(
            "/api/auth/profile",
            get(system::handlers::auth::get_profile)
                .put(system::handlers::auth::update_profile)
                .route_layer(require_auth.clone()),
        )
        .route(
            "/api/auth/change-password",
            post(system::handlers::auth::change_password).route_layer(require_auth.clone()),
        )
        .route(
            "/api/auth/account",
            delete(system::handlers::auth::delete_account).route_layer(require_auth),
        )
        // ========================================
        // CATALOG ROUTES (PUBLIC)
        // ========================================
        .route("/api/bands", get(handlers::bands::list))
        .route("/api/bands/featured", get(handlers::bands::featured))
        .route(
            "/api/bands/category/:category",
            get(handlers::bands::by_category),
        )
        .route(
            "/api/bands/compatible/:size",
            get(handlers::bands::compatible),
        )
        .route("/api/bands/search/:query", get(handlers::bands::search))
        .route("/api/bands/:id", get(handlers::bands::get_by_id))
        .route("/api/watches", get(handlers::watches::list))
        .route(
            "/api/watches/series/:series",
            get(handlers::watches::by_series),
        )
        .route("/api/watches/compare/:ids", get(handlers::watches::compare))
        .route("/api/watches/:id", get(handlers::watches::get_by_id))
        .route(
            "/api/watches/:id/compatibility",
            get(handlers::watches::compatibility),
        )
        // ========================================
        // CATALOG MANAGEMENT (ADMIN)
        // ========================================
        .route(
            "/api/bands",
            post(handlers::bands::create).route_layer(require_admin.clone()),
        )
        .route(
            "/api/bands/:id",
            put(handlers::bands::update)
                .delete(handlers::bands::delete)
                .route_layer(require_admin.clone()),
        )
        .route(
            "/api/watches",
            post(handlers::watches::create).route_layer(require_admin.clone()),
        )
        .route(
            "/api/watches/:id",
            put(handlers::watches::update).route_layer(require_admin.clone()),
        )
        // ========================================
        // CART ROUTES
        // ========================================
        .route("/api/cart", get(handlers::cart::get_cart))
        .route("/api/cart/add", post(handlers::cart::add_item))
        .route("/api/cart/update", put(handlers::cart::update_item))
        .route(
            "/api/cart/remove/:cartItemId",
            delete(handlers::cart::remove_item),
        )
        .route("/api/cart/clear", post(handlers::cart::clear))
        .route("/api/cart/merge", post(handlers::cart::merge))
        // ========================================
        // ORDER ROUTES
        // ========================================
        .route("/api/orders", post(handlers::orders::create))
        .route(
            "/api/orders/user/:userId",
            get(handlers::orders::list_for_user),
        )
        .route(
            "/api/orders/stats/overview",
            get(handlers::orders::statistics).route_layer(require_admin.clone()),
        )
        .route(
            "/api/orders/:orderNumber",
            get(handlers::orders::get_by_number),
        )
        .route(
            "/api/orders/:orderNumber/status",
            put(handlers::orders::update_status).route_layer(require_admin.clone()),
        )
        .route(
            "/api/orders/:orderNumber/cancel",
            post(handlers::orders::cancel),
        )
        // ========================================
        // CONTACT & NEWSLETTER ROUTES
        // ========================================
        .route("/api/contact", post(handlers::contact::submit))
        .route(
            "/api/contact",
            get(handlers::contact::list).route_layer(require_admin.clone()),
        )
        .route(
            "/api/contact/:id/read",
            put(handlers::contact::mark_read).route_layer(require_admin.clone()),
        )
        .route("/api/contact/newsletter", post(handlers::contact::subscribe))
        .route(
            "/api/contact/newsletter/subscribers",
            get(handlers::contact::list_subscribers).route_layer(require_admin.clone()),
        )
        .route(
            "/api/contact/newsletter/:email",
            delete(handlers::contact::unsubscribe),
        )
        // ========================================
        // ADMIN DASHBOARD
        // ========================================
        .route(
            "/api/admin/stats",
            get(handlers::admin::stats).route_layer(require_admin),
        )
        .fallback(not_found)
        .with_state(state)
}
