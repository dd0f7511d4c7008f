pub mod calendars;
pub mod error;
pub mod events;
pub mod extract;
pub mod health;

pub use error::AppError;
pub use extract::{JsonBody, PathParams};

use axum::Json;
use serde_json::{json, Value};

/// `{"message": <text>}` body returned by mutations without a payload.
pub(crate) fn message(text: &str) -> Json<Value> {
    Json(json!({ "message": text }))
}
