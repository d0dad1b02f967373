use axum::{
    body::Body,
    extract::{Request, State},
    middleware::Next,
    response::Response,
};

use crate::shared::error::ApiError;
use crate::shared::state::AppState;

/// Requires a valid bearer token. The decoded claims are stored in request
/// extensions for the `CurrentUser` extractor.
pub async fn require_auth(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Result<Response, ApiError> {
    let token = req
        .headers()
        .get("Authorization")
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(str::to_owned)
        .ok_or_else(|| ApiError::Unauthorized("Access token required".to_string()))?;

    let claims = super::jwt::verify_access_token(&state.config.jwt_secret, &token)
        .map_err(|_| ApiError::Forbidden("Invalid or expired token".to_string()))?;

    req.extensions_mut().insert(claims);

    Ok(next.run(req).await)
}

/// Requires the shared admin key in the X-Admin-Key header. With no key
/// configured every request is refused.
pub async fn require_admin(
    State(state): State<AppState>,
    req: Request<Body>,
    next: Next,
) -> Result<Response, ApiError> {
    let provided = req
        .headers()
        .get("x-admin-key")
        .and_then(|h| h.to_str().ok());

    let authorized = matches!(
        (&state.config.admin_key, provided),
        (Some(expected), Some(given)) if expected == given
    );

    if !authorized {
        return Err(ApiError::Forbidden("Unauthorized access".to_string()));
    }

    Ok(next.run(req).await)
}
