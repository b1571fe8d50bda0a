//! Health check route.

use axum::{Json, Router, routing::get};
use serde_json::json;

use crate::AppState;

/// Creates the health routes.
pub fn routes() -> Router<AppState> {
    Router::new().route("/health", get(health))
}

/// GET `/health`
async fn health() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}
