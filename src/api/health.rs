//! Health check endpoint

use axum::{response::IntoResponse, Json};
use serde_json::json;

/// Liveness probe for container orchestration
pub async fn health() -> impl IntoResponse {
    Json(json!({ "status": "healthy" }))
}
