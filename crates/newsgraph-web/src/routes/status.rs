//! Liveness route.

use axum::Json;
use serde_json::{json, Value};

pub async fn get_status() -> Json<Value> {
    Json(json!({ "status": "running" }))
}
