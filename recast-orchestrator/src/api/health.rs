//! Health Check API Handler
//!
//! Simple health check endpoint for monitoring.

use axum::Json;
use recast_core::dto::job::HealthStatus;

/// GET /health
/// Health check endpoint
pub async fn health_check() -> Json<HealthStatus> {
    Json(HealthStatus::ok())
}
