//! Health endpoint.
//!
//! `GET /health` answers 200 while the process is serving. Upstream
//! providers are not probed: they are third-party services and their
//! availability says nothing about this process.

use axum::Json;
use axum::extract::State;
use chrono::Utc;
use tracing::instrument;

use crate::models::HealthResponse;
use crate::state::AppState;

/// Health check endpoint.
///
/// # Response Body
///
/// ```json
/// {
///   "status": "ok",
///   "version": "0.1.0",
///   "timestamp": "2024-01-15T10:30:00Z",
///   "uptime_seconds": 3600,
///   "preference_records": 12
/// }
/// ```
#[instrument(skip(state))]
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: Utc::now(),
        uptime_seconds: state.uptime_seconds(),
        preference_records: state.preferences.user_count().await,
    })
}
