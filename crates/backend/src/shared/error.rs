use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use contracts::shared::ApiResponse;
use thiserror::Error;

/// Error taxonomy for the HTTP API. Every variant maps to a status code and
/// a `{ "success": false, "error": ... }` body.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Missing or malformed request data.
    #[error("{0}")]
    Validation(String),

    /// Authentication is missing or the credentials are wrong.
    #[error("{0}")]
    Unauthorized(String),

    /// The caller is authenticated but not allowed to do this.
    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    NotFound(String),

    /// The request is valid but conflicts with current state.
    #[error("{0}")]
    Conflict(String),

    /// Requested quantity exceeds available stock. The message carries the
    /// quantity still available.
    #[error("{0}")]
    OutOfStock(String),

    /// Unexpected failure. The public message stays generic; the source is
    /// logged server-side only.
    #[error("{message}")]
    Internal {
        message: String,
        #[source]
        source: anyhow::Error,
    },
}

impl ApiError {
    pub fn validation(message: impl Into<String>) -> Self {
        ApiError::Validation(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        ApiError::NotFound(message.into())
    }

    pub fn internal(message: impl Into<String>, source: anyhow::Error) -> Self {
        ApiError::Internal {
            message: message.into(),
            source,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            ApiError::Validation(_) | ApiError::OutOfStock(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        };

        if let ApiError::Internal { message, source } = &self {
            tracing::error!("{}: {:#}", message, source);
        }

        let body = ApiResponse::<()>::error(self.to_string());
        (status, Json(body)).into_response()
    }
}
