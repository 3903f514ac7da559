//! Health check endpoint

use axum::Json;

pub async fn health_check() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "ok",
        "service": "qr-cloud",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}
