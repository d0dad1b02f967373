use axum::extract::{Json, State};
use chrono::Utc;
use serde_json::{json, Value};

use crate::shared::state::AppState;

/// GET /api/health
///
/// Liveness probe for uptime monitors; deliberately outside the response
/// envelope.
pub async fn health(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "timestamp": Utc::now().to_rfc3339(),
        "service": "Pulse API",
        "version": "1.0.0",
        "environment": state.config.environment.clone(),
    }))
}
