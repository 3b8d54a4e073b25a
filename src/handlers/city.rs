use axum::extract::rejection::PathRejection;
use axum::extract::{Path, State};
use tracing::{error, instrument};

use crate::error::{AppError, AppResult};
use crate::state::AppState;
use crate::upstream::{UpstreamError, UpstreamJson};
use crate::validation::slugify;

pub const CITY_SCORES_NOT_FOUND: &str = "City scores not found on Teleport API.";

/// Urban-area scores for a city, proxied from Teleport.
///
/// Any city name is accepted and turned into a slug (`"New York City"` →
/// `new-york-city`); the slug is percent-encoded as a single path segment.
/// The upstream body is returned unchanged. An unknown slug is a 404; every
/// other upstream failure is logged and rendered as a 500.
#[instrument(skip_all, fields(slug))]
pub async fn city_scores(
    State(state): State<AppState>,
    city_name: Result<Path<String>, PathRejection>,
) -> AppResult<UpstreamJson> {
    let Path(city_name) = city_name?;

    let slug = slugify(&city_name);
    tracing::Span::current().record("slug", slug.as_str());

    state
        .teleport
        .city_scores(&slug)
        .await
        .map_err(|e| match e {
            UpstreamError::NotFound { .. } => AppError::NotFound(CITY_SCORES_NOT_FOUND.to_string()),
            other => {
                error!(error = %other, slug = %slug, "Error fetching scores");
                other.into()
            }
        })
}
