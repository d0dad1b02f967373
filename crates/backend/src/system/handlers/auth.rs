use axum::extract::{Json, State};
use axum::http::StatusCode;
use contracts::shared::ApiResponse;
use contracts::system::auth::{
    AppleLoginRequest, AuthResponse, ChangePasswordRequest, ForgotPasswordRequest, LoginRequest,
    RegisterRequest, ResetPasswordRequest, UpdateProfileRequest,
};
use contracts::system::users::PublicUser;

use crate::shared::error::ApiError;
use crate::shared::state::AppState;
use crate::system::auth::extractor::CurrentUser;
use crate::system::users::service;

/// POST /api/auth/register
pub async fn register(
    State(state): State<AppState>,
    Json(request): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<ApiResponse<AuthResponse>>), ApiError> {
    let auth = service::register(&state.db, &state.config.jwt_secret, request).await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::with_message("User registered successfully", auth)),
    ))
}

/// POST /api/auth/login
pub async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<ApiResponse<AuthResponse>>, ApiError> {
    let auth = service::login(&state.db, &state.config.jwt_secret, request).await?;
    Ok(Json(ApiResponse::with_message("Login successful", auth)))
}

/// POST /api/auth/apple
pub async fn apple_login(
    State(state): State<AppState>,
    Json(request): Json<AppleLoginRequest>,
) -> Result<Json<ApiResponse<AuthResponse>>, ApiError> {
    let auth = service::apple_login(&state.db, &state.config.jwt_secret, request).await?;
    Ok(Json(ApiResponse::with_message("Apple login successful", auth)))
}

/// GET /api/auth/profile
pub async fn get_profile(
    State(state): State<AppState>,
    CurrentUser(claims): CurrentUser,
) -> Result<Json<ApiResponse<PublicUser>>, ApiError> {
    let user = service::get_profile(&state.db, &claims.sub).await?;
    Ok(Json(ApiResponse::ok(user)))
}

/// PUT /api/auth/profile
pub async fn update_profile(
    State(state): State<AppState>,
    CurrentUser(claims): CurrentUser,
    Json(request): Json<UpdateProfileRequest>,
) -> Result<Json<ApiResponse<PublicUser>>, ApiError> {
    let user = service::update_profile(&state.db, &claims.sub, request).await?;
    Ok(Json(ApiResponse::with_message(
        "Profile updated successfully",
        user,
    )))
}

/// POST /api/auth/change-password
pub async fn change_password(
    State(state): State<AppState>,
    CurrentUser(claims): CurrentUser,
    Json(request): Json<ChangePasswordRequest>,
) -> Result<Json<ApiResponse<()>>, ApiError> {
    service::change_password(&state.db, &claims.sub, request).await?;
    Ok(Json(ApiResponse::message("Password changed successfully")))
}

/// POST /api/auth/forgot-password
pub async fn forgot_password(
    State(state): State<AppState>,
    Json(request): Json<ForgotPasswordRequest>,
) -> Result<Json<ApiResponse<()>>, ApiError> {
    service::forgot_password(&state.db, &state.config, state.mailer.as_ref(), request).await?;
    Ok(Json(ApiResponse::message(service::RESET_NOTICE)))
}

/// POST /api/auth/reset-password
pub async fn reset_password(
    State(state): State<AppState>,
    Json(request): Json<ResetPasswordRequest>,
) -> Result<Json<ApiResponse<()>>, ApiError> {
    service::reset_password(&state.db, &state.config.jwt_secret, request).await?;
    Ok(Json(ApiResponse::message("Password reset successfully")))
}

/// DELETE /api/auth/account
pub async fn delete_account(
    State(state): State<AppState>,
    CurrentUser(claims): CurrentUser,
) -> Result<Json<ApiResponse<()>>, ApiError> {
    service::delete_account(&state.db, &claims.sub).await?;
    Ok(Json(ApiResponse::message("Account deleted successfully")))
}
