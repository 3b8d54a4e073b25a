use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::Units;

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Always "ok" while the process is serving
    pub status: String,
    /// Crate version
    pub version: String,
    pub timestamp: DateTime<Utc>,
    pub uptime_seconds: u64,
    /// Users with stored preferences
    pub preference_records: usize,
}

/// Request body for `POST /auth/token`.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TokenRequest {
    pub username: String,
}

/// Issued bearer token.
#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub token: String,
    /// Always "Bearer"
    pub token_type: &'static str,
    /// Lifetime in seconds
    pub expires_in: u64,
}

/// Claims of the caller, as decoded by the auth context middleware.
#[derive(Debug, Serialize)]
pub struct MeResponse {
    pub user_id: String,
    pub claims: Map<String, Value>,
}

/// Query string for `GET /api/weather/{city}`.
#[derive(Debug, Default, Deserialize)]
pub struct WeatherParams {
    /// Overrides the caller's stored preference when present
    pub units: Option<Units>,
}

/// Query string for `GET /getwalkscore`.
#[derive(Debug, Deserialize)]
pub struct WalkScoreParams {
    pub address: Option<String>,
    pub lat: Option<f64>,
    pub lon: Option<f64>,
}
