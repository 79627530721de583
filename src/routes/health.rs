use axum::Json;
use serde_json::{json, Value};

pub async fn banner() -> Json<Value> {
    Json(json!({
        "message": "Kelma API",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

pub async fn health() -> Json<Value> {
    Json(json!({ "status": "healthy" }))
}
