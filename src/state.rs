//! Shared application state for Axum handlers.
//!
//! Built once at startup from a validated [`Config`] and cloned into every
//! handler. Everything inside is either immutable or behind an `Arc`, so a
//! clone is a handful of reference-count bumps:
//!
//! - **Configuration**: read-only after startup
//! - **Upstream clients**: Teleport, weather and Walk Score, sharing one
//!   `reqwest` connection pool
//! - **Services**: preference storage and token issuing

use std::sync::Arc;
use std::time::Instant;

use axum::extract::FromRef;
use tracing::warn;

use crate::config::Config;
use crate::error::{AppError, AppResult};
use crate::services::{PreferenceService, TokenService};
use crate::upstream::{TeleportClient, UpstreamClient, WalkScoreClient, WeatherClient};

/// Shared application state for Axum handlers.
#[derive(Clone)]
pub struct AppState {
    /// Application configuration
    pub config: Arc<Config>,
    pub teleport: TeleportClient,
    pub weather: WeatherClient,
    pub walkscore: WalkScoreClient,
    pub preferences: PreferenceService,
    pub tokens: TokenService,
    /// Timestamp when the application started
    pub started_at: Instant,
}

impl AppState {
    /// Create application state from configuration.
    ///
    /// # Errors
    ///
    /// Returns `AppError::ConfigError` if the upstream HTTP client cannot be
    /// built.
    pub fn new(config: Config) -> AppResult<Self> {
        let http = UpstreamClient::new(config.upstream_timeout)
            .map_err(|e| AppError::ConfigError(format!("Failed to build HTTP client: {e}")))?;

        if config.uses_dev_secret() {
            warn!("JWT_SECRET not set, issuing tokens with the development secret");
        }

        let weather = WeatherClient::new(
            http.clone(),
            config.weather_base_url.clone(),
            config.weather_api_key.clone(),
        );
        if !weather.is_configured() {
            warn!("WEATHER_API_KEY not set, weather route will answer 500");
        }

        let walkscore = WalkScoreClient::new(
            http.clone(),
            config.walkscore_base_url.clone(),
            config.walkscore_api_key.clone(),
        );
        if !walkscore.is_configured() {
            warn!("WALKSCORE_API_KEY not set, walkscore route will answer 500");
        }

        Ok(Self {
            teleport: TeleportClient::new(http, config.teleport_base_url.clone()),
            weather,
            walkscore,
            preferences: PreferenceService::new(),
            tokens: TokenService::new(&config.jwt_secret, config.token_ttl),
            started_at: Instant::now(),
            config: Arc::new(config),
        })
    }

    /// Get the application uptime in seconds.
    pub fn uptime_seconds(&self) -> u64 {
        self.started_at.elapsed().as_secs()
    }
}

impl FromRef<AppState> for TokenService {
    fn from_ref(state: &AppState) -> Self {
        state.tokens.clone()
    }
}
