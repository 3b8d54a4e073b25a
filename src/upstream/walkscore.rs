use tracing::instrument;

use super::{UpstreamClient, UpstreamError, UpstreamJson, build_url};

const PROVIDER: &str = "walkscore";

/// Location to score. Walk Score needs both the address and coordinates.
#[derive(Debug, Clone)]
pub struct WalkScoreQuery {
    pub address: String,
    pub lat: f64,
    pub lon: f64,
}

/// Client for the Walk Score `/score` endpoint.
#[derive(Debug, Clone)]
pub struct WalkScoreClient {
    http: UpstreamClient,
    base_url: String,
    api_key: Option<String>,
}

impl WalkScoreClient {
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

    /// Walk, transit and bike scores for a location.
    #[instrument(skip(self))]
    pub async fn score(&self, location: &WalkScoreQuery) -> Result<UpstreamJson, UpstreamError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or(UpstreamError::NotConfigured { provider: PROVIDER })?;

        let url = build_url(PROVIDER, &self.base_url, &["score"])?;
        let lat = location.lat.to_string();
        let lon = location.lon.to_string();
        let query = [
            ("format", "json"),
            ("address", location.address.as_str()),
            ("lat", lat.as_str()),
            ("lon", lon.as_str()),
            ("transit", "1"),
            ("bike", "1"),
            ("wsapikey", api_key),
        ];

        self.http.get_json(PROVIDER, url, &query).await
    }
}
