//! Health and readiness endpoints.

use axum::{http::StatusCode, Json};
use serde::Serialize;

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Service status
    pub status: &'static str,
}

/// Liveness probe. Always returns 200 while the process is up.
pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}

/// Readiness probe.
pub async fn readiness_check() -> StatusCode {
    StatusCode::OK
}
