use axum::Json;
use serde_json::{Value, json};

/// GET /
pub async fn root() -> Json<Value> {
    Json(json!({
        "message": "Portfolio API is running",
        "status": "ok",
    }))
}

/// GET /health
pub async fn health() -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "service": "portfolio-api",
    }))
}
