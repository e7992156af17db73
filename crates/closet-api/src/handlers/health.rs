use axum::Json;
use serde_json::{json, Value};

/// Liveness probe. No collaborator calls.
pub async fn health() -> Json<Value> {
    Json(json!({"status": "ok"}))
}
