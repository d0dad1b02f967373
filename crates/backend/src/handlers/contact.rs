use axum::extract::{Json, Path, Query, State};
use axum::http::StatusCode;
use contracts::domain::{
    ContactReceipt, ContactRequest, ContactSubmission, NewsletterSubscriber, SubscribeRequest,
    UnsubscribeRequest,
};
use contracts::shared::{ApiResponse, Pagination};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::domain::contact::service;
use crate::shared::error::ApiError;
use crate::shared::state::AppState;

const DEFAULT_SUBMISSION_PAGE: u64 = 50;
const DEFAULT_SUBSCRIBER_PAGE: u64 = 100;

/// Filter flags arrive as strings; anything but the literal `true` leaves
/// the listing unfiltered.
#[derive(Debug, Deserialize)]
pub struct SubmissionQuery {
    pub limit: Option<u64>,
    pub offset: Option<u64>,
    pub unread: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SubscriberQuery {
    pub limit: Option<u64>,
    pub offset: Option<u64>,
    pub active: Option<String>,
}

/// POST /api/contact
pub async fn submit(
    State(state): State<AppState>,
    Json(request): Json<ContactRequest>,
) -> Result<(StatusCode, Json<ApiResponse<ContactReceipt>>), ApiError> {
    let receipt =
        service::submit(&state.db, &state.config, state.mailer.as_ref(), request).await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::with_message("Message sent successfully", receipt)),
    ))
}

/// GET /api/contact (admin)
pub async fn list(
    State(state): State<AppState>,
    Query(query): Query<SubmissionQuery>,
) -> Result<Json<ApiResponse<Vec<ContactSubmission>>>, ApiError> {
    let limit = query.limit.unwrap_or(DEFAULT_SUBMISSION_PAGE);
    let offset = query.offset.unwrap_or(0);
    let unread_only = query.unread.as_deref() == Some("true");
    let (submissions, total) = service::list(&state.db, limit, offset, unread_only).await?;
    let has_more = submissions.len() as u64 == limit;
    Ok(Json(ApiResponse::page(
        submissions,
        Pagination {
            total,
            limit,
            offset,
            has_more,
        },
    )))
}

/// PUT /api/contact/:id/read (admin)
pub async fn mark_read(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<()>>, ApiError> {
    service::mark_read(&state.db, &id).await?;
    Ok(Json(ApiResponse::message("Submission marked as read")))
}

/// POST /api/contact/newsletter
///
/// A known address answers 200 with a top-level `alreadySubscribed` flag;
/// fresh subscriptions answer 201.
pub async fn subscribe(
    State(state): State<AppState>,
    Json(request): Json<SubscribeRequest>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let outcome =
        service::subscribe(&state.db, &state.config, state.mailer.as_ref(), request).await?;
    if outcome.already_subscribed {
        Ok((
            StatusCode::OK,
            Json(json!({
                "success": true,
                "message": "Already subscribed to newsletter",
                "alreadySubscribed": true,
            })),
        ))
    } else {
        Ok((
            StatusCode::CREATED,
            Json(json!({
                "success": true,
                "message": "Successfully subscribed to newsletter",
            })),
        ))
    }
}

/// GET /api/contact/newsletter/subscribers (admin)
pub async fn list_subscribers(
    State(state): State<AppState>,
    Query(query): Query<SubscriberQuery>,
) -> Result<Json<ApiResponse<Vec<NewsletterSubscriber>>>, ApiError> {
    let limit = query.limit.unwrap_or(DEFAULT_SUBSCRIBER_PAGE);
    let offset = query.offset.unwrap_or(0);
    let active_only = query.active.as_deref() == Some("true");
    let (subscribers, total) =
        service::list_subscribers(&state.db, limit, offset, active_only).await?;
    let has_more = subscribers.len() as u64 == limit;
    Ok(Json(ApiResponse::page(
        subscribers,
        Pagination {
            total,
            limit,
            offset,
            has_more,
        },
    )))
}

/// DELETE /api/contact/newsletter/:email
///
/// Unsubscribe links send no body, so the reason is optional twice over.
pub async fn unsubscribe(
    State(state): State<AppState>,
    Path(email): Path<String>,
    request: Option<Json<UnsubscribeRequest>>,
) -> Result<Json<ApiResponse<()>>, ApiError> {
    let request = request.map(|Json(r)| r).unwrap_or_default();
    service::unsubscribe(&state.db, &email, request).await?;
    Ok(Json(ApiResponse::message(
        "Successfully unsubscribed from newsletter",
    )))
}
