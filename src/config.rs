//! Application configuration loaded from environment variables.
//!
//! All configuration is loaded once at startup with sensible defaults for
//! development, validated, and then shared read-only behind an `Arc`. In
//! production, configure via environment variables or a `.env` file.
//!
//! # Upstream Providers
//!
//! - `TELEPORT_BASE_URL`: urban-area scores (default: `https://api.teleport.org`)
//! - `WEATHER_BASE_URL` / `WEATHER_API_KEY`: OpenWeatherMap current weather
//! - `WALKSCORE_BASE_URL` / `WALKSCORE_API_KEY`: Walk Score
//! - `UPSTREAM_TIMEOUT_SECS`: bound on every upstream call (default: 10)
//!
//! # Security Configuration
//!
//! - `JWT_SECRET`: HS256 secret used by `/auth/token` when issuing tokens
//! - `CORS_ALLOWED_ORIGINS`: Comma-separated list of allowed origins (default: `*`)

use std::env;
use std::time::Duration;

use reqwest::Url;

use crate::error::{AppError, AppResult};

/// Secret used when `JWT_SECRET` is not set. Only suitable for local development.
pub const DEV_JWT_SECRET: &str = "secret-dev";

/// Application configuration loaded from environment variables.
///
/// # Example
///
/// ```rust,ignore
/// let config = Config::from_env()?;
/// println!("Server will listen on {}", config.server_addr());
/// ```
#[derive(Debug, Clone)]
pub struct Config {
    // =========================================================================
    // Server Configuration
    // =========================================================================
    /// Server host address (default: "0.0.0.0")
    pub host: String,

    /// Server port (default: 3001)
    pub port: u16,

    /// Maximum JSON request body size in bytes (default: 1MB)
    pub max_request_body_size: usize,

    /// Allowed CORS origins. `*` allows any origin.
    pub cors_allowed_origins: Vec<String>,

    // =========================================================================
    // Token Configuration
    // =========================================================================
    /// Secret for signing issued tokens
    pub jwt_secret: String,

    /// Lifetime of issued tokens (default: 24h)
    pub token_ttl: Duration,

    // =========================================================================
    // Upstream Configuration
    // =========================================================================
    pub teleport_base_url: String,

    pub weather_base_url: String,

    /// OpenWeatherMap API key (weather route answers 500 when unset)
    pub weather_api_key: Option<String>,

    pub walkscore_base_url: String,

    /// Walk Score API key (walkscore route answers 500 when unset)
    pub walkscore_api_key: Option<String>,

    /// Timeout for a single upstream request, connect included
    pub upstream_timeout: Duration,

    // =========================================================================
    // Observability Configuration
    // =========================================================================
    /// Log level filter (e.g., "info", "debug", "lamb_api=trace")
    pub log_level: String,

    /// Emit logs as JSON lines instead of human-readable text
    pub log_json: bool,

    /// Port for Prometheus metrics endpoint (0 = disabled)
    pub metrics_port: u16,
}

impl Config {
    /// Load configuration from environment variables with sensible defaults.
    ///
    /// # Errors
    ///
    /// Returns `AppError::ConfigError` if any value is invalid
    /// (e.g., non-numeric PORT value, unparsable base URL).
    pub fn from_env() -> AppResult<Self> {
        // Load an .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let defaults = Self::default();

        let config = Self {
            host: env::var("HOST").unwrap_or(defaults.host),
            port: Self::parse_env("PORT", defaults.port)?,
            max_request_body_size: Self::parse_env(
                "MAX_REQUEST_BODY_SIZE",
                defaults.max_request_body_size,
            )?,
            cors_allowed_origins: Self::parse_cors_origins(),

            jwt_secret: Self::non_empty_env("JWT_SECRET").unwrap_or(defaults.jwt_secret),
            token_ttl: Duration::from_secs(Self::parse_env(
                "TOKEN_TTL_SECS",
                defaults.token_ttl.as_secs(),
            )?),

            teleport_base_url: Self::non_empty_env("TELEPORT_BASE_URL")
                .unwrap_or(defaults.teleport_base_url),
            weather_base_url: Self::non_empty_env("WEATHER_BASE_URL")
                .unwrap_or(defaults.weather_base_url),
            weather_api_key: Self::non_empty_env("WEATHER_API_KEY"),
            walkscore_base_url: Self::non_empty_env("WALKSCORE_BASE_URL")
                .unwrap_or(defaults.walkscore_base_url),
            walkscore_api_key: Self::non_empty_env("WALKSCORE_API_KEY"),
            upstream_timeout: Duration::from_secs(Self::parse_env(
                "UPSTREAM_TIMEOUT_SECS",
                defaults.upstream_timeout.as_secs(),
            )?),

            log_level: env::var("RUST_LOG").unwrap_or(defaults.log_level),
            log_json: env::var("LOG_FORMAT").is_ok_and(|f| f.eq_ignore_ascii_case("json")),
            metrics_port: Self::parse_env("METRICS_PORT", defaults.metrics_port)?,
        };

        config.validate()?;

        Ok(config)
    }

    /// Validate configuration values for consistency and correctness.
    ///
    /// # Errors
    ///
    /// Returns `AppError::ConfigError` if validation fails.
    pub fn validate(&self) -> AppResult<()> {
        if self.max_request_body_size == 0 {
            return Err(AppError::ConfigError(
                "MAX_REQUEST_BODY_SIZE must be greater than 0".to_string(),
            ));
        }

        if self.upstream_timeout.is_zero() {
            return Err(AppError::ConfigError(
                "UPSTREAM_TIMEOUT_SECS must be greater than 0".to_string(),
            ));
        }

        if self.token_ttl.is_zero() {
            return Err(AppError::ConfigError(
                "TOKEN_TTL_SECS must be greater than 0".to_string(),
            ));
        }

        for (name, value) in [
            ("TELEPORT_BASE_URL", &self.teleport_base_url),
            ("WEATHER_BASE_URL", &self.weather_base_url),
            ("WALKSCORE_BASE_URL", &self.walkscore_base_url),
        ] {
            validate_base_url(name, value)?;
        }

        Ok(())
    }

    /// Get the full server address for binding.
    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Whether tokens are being signed with the built-in development secret.
    pub fn uses_dev_secret(&self) -> bool {
        self.jwt_secret == DEV_JWT_SECRET
    }

    /// Check if Prometheus metrics export is enabled.
    pub fn metrics_enabled(&self) -> bool {
        self.metrics_port > 0
    }

    /// Get the metrics endpoint address.
    ///
    /// Returns `None` if metrics are disabled (port = 0).
    pub fn metrics_addr(&self) -> Option<std::net::SocketAddr> {
        self.metrics_enabled()
            .then(|| std::net::SocketAddr::from(([0, 0, 0, 0], self.metrics_port)))
    }

    /// Parse an environment variable into the specified type with a default value.
    fn parse_env<T>(name: &str, default: T) -> AppResult<T>
    where
        T: std::str::FromStr,
        T::Err: std::fmt::Display,
    {
        match env::var(name) {
            Ok(val) => val
                .trim()
                .parse()
                .map_err(|e| AppError::ConfigError(format!("Invalid {name}: {e}"))),
            Err(_) => Ok(default),
        }
    }

    fn non_empty_env(name: &str) -> Option<String> {
        env::var(name)
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }

    /// Parse CORS allowed origins from environment variable.
    fn parse_cors_origins() -> Vec<String> {
        env::var("CORS_ALLOWED_ORIGINS")
            .unwrap_or_else(|_| "*".to_string())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect()
    }
}

fn validate_base_url(name: &str, value: &str) -> AppResult<()> {
    let url = Url::parse(value)
        .map_err(|e| AppError::ConfigError(format!("Invalid {name} '{value}': {e}")))?;

    if !matches!(url.scheme(), "http" | "https") {
        return Err(AppError::ConfigError(format!(
            "{name} must use http or https, got '{}'",
            url.scheme()
        )));
    }

    Ok(())
}

/// Default configuration for testing and development.
///
/// Production deployments should use `Config::from_env()` instead.
impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3001,
            max_request_body_size: 1024 * 1024,
            cors_allowed_origins: vec!["*".to_string()],
            jwt_secret: DEV_JWT_SECRET.to_string(),
            token_ttl: Duration::from_secs(24 * 60 * 60),
            teleport_base_url: "https://api.teleport.org".to_string(),
            weather_base_url: "https://api.openweathermap.org".to_string(),
            weather_api_key: None,
            walkscore_base_url: "https://api.walkscore.com".to_string(),
            walkscore_api_key: None,
            upstream_timeout: Duration::from_secs(10),
            log_level: "info".to_string(),
            log_json: false,
            metrics_port: 0,
        }
    }
}
