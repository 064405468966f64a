use axum::Json;
use chrono::Utc;

pub async fn root() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "message": "AWS Cost Analysis API",
        "dashboard": "/dashboard",
    }))
}

pub async fn health_check() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "healthy",
        "timestamp": Utc::now().to_rfc3339(),
    }))
}
