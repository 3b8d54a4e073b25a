use tracing::instrument;

use super::{UpstreamClient, UpstreamError, UpstreamJson, build_url};
use crate::models::Units;

const PROVIDER: &str = "weather";

/// Client for the OpenWeatherMap current-weather endpoint.
#[derive(Debug, Clone)]
pub struct WeatherClient {
    http: UpstreamClient,
    base_url: String,
    api_key: Option<String>,
}

impl WeatherClient {
    pub fn new(http: UpstreamClient, base_url: impl Into<String>, api_key: Option<String>) -> Self {
        Self {
            http,
            base_url: base_url.into(),
            api_key,
        }
    }

    pub fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    /// Current conditions for `city` via `/data/2.5/weather`.
    #[instrument(skip(self))]
    pub async fn current(&self, city: &str, units: Units) -> Result<UpstreamJson, UpstreamError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or(UpstreamError::NotConfigured { provider: PROVIDER })?;

        let url = build_url(PROVIDER, &self.base_url, &["data", "2.5", "weather"])?;
        let query = [
            ("q", city),
            ("units", units.as_str()),
            ("appid", api_key),
        ];

        self.http.get_json(PROVIDER, url, &query).await
    }
}
