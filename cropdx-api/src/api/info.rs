//! Root endpoint with basic API information

use axum::{routing::get, Json, Router};
use serde_json::{json, Value};

use crate::AppState;

/// GET /
pub async fn root_info() -> Json<Value> {
    Json(json!({
        "message": "Welcome to the CropDx API",
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": {
            "health": "/health",
            "register": "/api/register",
            "login": "/api/login",
            "refresh": "/api/token/refresh",
            "logout": "/api/logout",
            "me": "/api/me",
            "diseases": "/api/diseases",
            "detections": "/api/detections",
            "detection": "/api/ai-detect",
            "media": "/media/",
        },
        "documentation": "All /api endpoints except register, login and refresh need an Authorization: Bearer token",
    }))
}

pub fn routes() -> Router<AppState> {
    Router::new().route("/", get(root_info))
}
