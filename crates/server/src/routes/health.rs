use std::sync::Arc;

use axum::{Extension, Json};
use serde_json::{json, Value};

use crate::rooms::registry::Rooms;

/// GET /health
pub async fn health_check(Extension(rooms): Extension<Arc<Rooms>>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "rooms": rooms.count().await,
    }))
}
