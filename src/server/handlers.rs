//! Endpoint handlers

use super::AppState;
use axum::{extract::State, response::IntoResponse, Json};
use chrono::{SecondsFormat, Utc};
use serde_json::json;

pub const SERVICE_NAME: &str = "20-50 EMA Cross Over Bot";
pub const SERVICE_VERSION: &str = "0.1";

fn now_iso() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// `GET /` service banner
pub async fn root() -> impl IntoResponse {
    Json(json!({
        "success": true,
        "message": SERVICE_NAME,
        "version": SERVICE_VERSION,
        "timestamp": now_iso(),
        "endPoints": {
            "rootEndpoint": "/",
            "healthCheck": "/health",
            "baseURL": "/api",
        },
    }))
}

/// `GET /health` liveness check
pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let uptime = state.started.elapsed().as_secs_f64();

    Json(json!({
        "success": true,
        "message": "UP",
        "uptime": format!("{:.3}s", uptime),
        "timestamp": now_iso(),
    }))
}
