//! Liveness endpoint.

use axum::{http::StatusCode, Json};
use serde_json::{json, Value};

/// GET /health - Returns 200 without touching storage or identity.
#[axum::debug_handler]
pub async fn health() -> (StatusCode, Json<Value>) {
    (StatusCode::OK, Json(json!({ "status": "ok" })))
}
