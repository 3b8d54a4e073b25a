//! Clients for the third-party APIs the gateway proxies.
//!
//! All providers share one [`UpstreamClient`], a thin wrapper around a
//! `reqwest::Client` with a bounded request timeout. Each provider client
//! builds its URL, performs a single GET and hands back the upstream JSON
//! body untouched, or a typed [`UpstreamError`].
//!
//! ```text
//! Handler ──▶ TeleportClient / WeatherClient / WalkScoreClient
//!                          │
//!                          ▼
//!                 UpstreamClient::get_json  (timeout, metrics, logging)
//!                          │
//!                          ▼
//!                   third-party REST API
//! ```
//!
//! No retries and no caching: every call is a read-through.

mod teleport;
mod walkscore;
mod weather;

pub use teleport::TeleportClient;
pub use walkscore::{WalkScoreClient, WalkScoreQuery};
pub use weather::WeatherClient;

use std::time::{Duration, Instant};

use axum::body::Bytes;
use axum::http::header::CONTENT_TYPE;
use axum::response::{IntoResponse, Response};
use reqwest::{Client, StatusCode, Url};
use thiserror::Error;
use tracing::{debug, warn};

use crate::error::AppError;
use crate::metrics;

/// Failure talking to an upstream provider.
#[derive(Debug, Error)]
pub enum UpstreamError {
    #[error("{provider} returned 404 Not Found")]
    NotFound { provider: &'static str },

    #[error("{provider} returned HTTP {status}")]
    Status {
        provider: &'static str,
        status: StatusCode,
    },

    #[error("{provider} request timed out")]
    Timeout { provider: &'static str },

    #[error("{provider} request failed: {source}")]
    Transport {
        provider: &'static str,
        #[source]
        source: reqwest::Error,
    },

    #[error("{provider} returned a body that is not valid JSON: {detail}")]
    Decode {
        provider: &'static str,
        detail: String,
    },

    #[error("{provider} URL could not be built: {detail}")]
    InvalidUrl {
        provider: &'static str,
        detail: String,
    },

    #[error("{provider} is not configured")]
    NotConfigured { provider: &'static str },
}

impl UpstreamError {
    /// Short label used for the `outcome` metric dimension.
    fn outcome(&self) -> &'static str {
        match self {
            Self::NotFound { .. } => "not_found",
            Self::Status { .. } => "http_error",
            Self::Timeout { .. } => "timeout",
            Self::Transport { .. } => "transport_error",
            Self::Decode { .. } => "decode_error",
            Self::InvalidUrl { .. } => "invalid_url",
            Self::NotConfigured { .. } => "not_configured",
        }
    }
}

/// Anything not handled explicitly by a handler is a generic upstream failure.
impl From<UpstreamError> for AppError {
    fn from(e: UpstreamError) -> Self {
        match e {
            UpstreamError::NotConfigured { .. } => AppError::Internal(e.to_string()),
            _ => AppError::Upstream(e.to_string()),
        }
    }
}

/// A JSON document received from upstream, forwarded byte-for-byte.
#[derive(Debug, Clone)]
pub struct UpstreamJson(Bytes);

impl IntoResponse for UpstreamJson {
    fn into_response(self) -> Response {
        (
            StatusCode::OK,
            [(CONTENT_TYPE, "application/json")],
            self.0,
        )
            .into_response()
    }
}

/// Shared HTTP client for all providers.
///
/// Cloning is cheap; clones share the same connection pool.
#[derive(Debug, Clone)]
pub struct UpstreamClient {
    http: Client,
}

impl UpstreamClient {
    /// Build a client whose requests are bounded by `timeout`.
    ///
    /// # Errors
    ///
    /// Returns an error when the TLS backend cannot be initialized.
    pub fn new(timeout: Duration) -> Result<Self, reqwest::Error> {
        let http = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("lamb_api/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { http })
    }

    /// GET `url` and return its body if it is a successful JSON response.
    ///
    /// `query` pairs are appended to the URL. They are never logged since
    /// they may carry API keys.
    pub async fn get_json(
        &self,
        provider: &'static str,
        url: Url,
        query: &[(&str, &str)],
    ) -> Result<UpstreamJson, UpstreamError> {
        let started = Instant::now();
        let result = self.fetch(provider, url, query).await;
        let elapsed = started.elapsed().as_secs_f64();

        match &result {
            Ok(_) => metrics::record_upstream_request(provider, "success", elapsed),
            Err(e) => metrics::record_upstream_request(provider, e.outcome(), elapsed),
        }

        result
    }

    async fn fetch(
        &self,
        provider: &'static str,
        url: Url,
        query: &[(&str, &str)],
    ) -> Result<UpstreamJson, UpstreamError> {
        debug!(provider, path = url.path(), "Calling upstream");

        let response = self
            .http
            .get(url)
            .query(query)
            .send()
            .await
            .map_err(|e| transport_error(provider, e))?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(UpstreamError::NotFound { provider });
        }
        if !status.is_success() {
            warn!(provider, status = status.as_u16(), "Upstream returned an error status");
            return Err(UpstreamError::Status { provider, status });
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| transport_error(provider, e))?;

        serde_json::from_slice::<serde::de::IgnoredAny>(&body).map_err(|e| {
            UpstreamError::Decode {
                provider,
                detail: e.to_string(),
            }
        })?;

        Ok(UpstreamJson(body))
    }
}

fn transport_error(provider: &'static str, source: reqwest::Error) -> UpstreamError {
    if source.is_timeout() {
        UpstreamError::Timeout { provider }
    } else {
        UpstreamError::Transport {
            provider,
            source: source.without_url(),
        }
    }
}

/// Parse `base` and append `segments` to its path.
///
/// Each segment is percent-encoded, so user input cannot inject extra path
/// components or a query string. An empty final segment yields a trailing
/// slash.
pub(crate) fn build_url(
    provider: &'static str,
    base: &str,
    segments: &[&str],
) -> Result<Url, UpstreamError> {
    let invalid = |detail: String| UpstreamError::InvalidUrl { provider, detail };

    let mut url = Url::parse(base).map_err(|e| invalid(e.to_string()))?;
    url.path_segments_mut()
        .map_err(|()| invalid(format!("'{base}' cannot be a base URL")))?
        .pop_if_empty()
        .extend(segments);

    Ok(url)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_build_url_appends_segments() {
        let url = build_url(
            "teleport",
            "https://api.teleport.org",
            &["api", "urban_areas", "slug:boston", "scores", ""],
        )
        .unwrap();

        assert_eq!(
            url.as_str(),
            "https://api.teleport.org/api/urban_areas/slug:boston/scores/"
        );
    }

    #[test]
    fn test_build_url_keeps_base_path() {
        let url = build_url("weather", "http://127.0.0.1:9000/proxy/", &["data"]).unwrap();
        assert_eq!(url.as_str(), "http://127.0.0.1:9000/proxy/data");
    }

    #[test]
    fn test_build_url_encodes_segment() {
        let url = build_url("teleport", "https://api.teleport.org", &["slug:a/b?c"]).unwrap();
        assert_eq!(url.path(), "/slug:a%2Fb%3Fc");
        assert!(url.query().is_none());
    }

    #[test]
    fn test_build_url_rejects_invalid_base() {
        let err = build_url("teleport", "not a url", &["x"]).unwrap_err();
        assert!(matches!(err, UpstreamError::InvalidUrl { .. }));
    }

    #[test]
    fn test_not_configured_maps_to_internal() {
        let err: AppError = UpstreamError::NotConfigured { provider: "weather" }.into();
        assert!(matches!(err, AppError::Internal(_)));
    }

    #[test]
    fn test_status_maps_to_upstream_failure() {
        let err: AppError = UpstreamError::Status {
            provider: "teleport",
            status: StatusCode::BAD_GATEWAY,
        }
        .into();
        assert!(matches!(err, AppError::Upstream(_)));
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_client_builds() {
        assert!(UpstreamClient::new(Duration::from_secs(1)).is_ok());
    }
}
