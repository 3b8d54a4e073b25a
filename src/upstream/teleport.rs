use tracing::instrument;

use super::{UpstreamClient, UpstreamError, UpstreamJson, build_url};

const PROVIDER: &str = "teleport";

/// Client for the Teleport urban-areas API.
#[derive(Debug, Clone)]
pub struct TeleportClient {
    http: UpstreamClient,
    base_url: String,
}

impl TeleportClient {
    pub fn new(http: UpstreamClient, base_url: impl Into<String>) -> Self {
        Self {
            http,
            base_url: base_url.into(),
        }
    }

    /// Fetch `/api/urban_areas/slug:{slug}/scores/`.
    #[instrument(skip(self))]
    pub async fn city_scores(&self, slug: &str) -> Result<UpstreamJson, UpstreamError> {
        let slug_segment = format!("slug:{slug}");
        let url = build_url(
            PROVIDER,
            &self.base_url,
            &["api", "urban_areas", slug_segment.as_str(), "scores", ""],
        )?;

        self.http.get_json(PROVIDER, url, &[]).await
    }
}
