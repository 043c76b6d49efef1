//! Plain endpoints and routing fallbacks.

use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::error::ApiError;
use super::AppState;

/// Body returned by `GET /hello`.
pub const HELLO_MESSAGE: &str = "Hello from tollgate! 👋";

/// Service name reported by the health endpoint.
pub const SERVICE_NAME: &str = "tollgate";

/// Body returned by `GET /health`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    /// Unix timestamp in seconds
    pub timestamp: i64,
    pub service: String,
    pub uptime: String,
    pub tracked_clients: usize,
}

pub async fn hello() -> &'static str {
    HELLO_MESSAGE
}

pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_owned(),
        timestamp: chrono::Utc::now().timestamp(),
        service: SERVICE_NAME.to_owned(),
        uptime: format_uptime(state.started_at.elapsed()),
        tracked_clients: state.limiter.visitor_count(),
    })
}

pub async fn get_only() -> ApiError {
    ApiError::method_not_allowed("GET")
}

pub async fn post_only() -> ApiError {
    ApiError::method_not_allowed("POST")
}

pub async fn not_found() -> ApiError {
    ApiError::not_found()
}

/// Render a duration as `1h2m3s`, dropping leading zero units.
fn format_uptime(uptime: Duration) -> String {
    let secs = uptime.as_secs();
    let (hours, minutes, seconds) = (secs / 3600, (secs % 3600) / 60, secs % 60);

    if hours > 0 {
        format!("{hours}h{minutes}m{seconds}s")
    } else if minutes > 0 {
        format!("{minutes}m{seconds}s")
    } else {
        format!("{seconds}s")
    }
}
