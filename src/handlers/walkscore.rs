use axum::extract::rejection::QueryRejection;
use axum::extract::{Query, State};
use tracing::{instrument, warn};

use crate::error::{AppError, AppResult};
use crate::models::WalkScoreParams;
use crate::state::AppState;
use crate::upstream::{UpstreamError, UpstreamJson, WalkScoreQuery};
use crate::validation::{validate_coordinates, validate_location};

pub const WALKSCORE_NOT_FOUND: &str = "Walk Score not found for this location.";

/// Walk, transit and bike scores, proxied from Walk Score.
///
/// `address`, `lat` and `lon` are all required.
#[instrument(skip_all)]
pub async fn walkscore(
    State(state): State<AppState>,
    params: Result<Query<WalkScoreParams>, QueryRejection>,
) -> AppResult<UpstreamJson> {
    let Query(params) = params?;
    let query = into_query(params)?;

    state.walkscore.score(&query).await.map_err(|e| match e {
        UpstreamError::NotFound { .. } => AppError::NotFound(WALKSCORE_NOT_FOUND.to_string()),
        other => {
            warn!(error = %other, address = %query.address, "Error fetching walk score");
            other.into()
        }
    })
}

fn into_query(params: WalkScoreParams) -> AppResult<WalkScoreQuery> {
    let (Some(address), Some(lat), Some(lon)) = (params.address, params.lat, params.lon) else {
        return Err(AppError::BadRequest(
            "address, lat and lon query parameters are required".to_string(),
        ));
    };

    validate_location(&address, "address")?;
    validate_coordinates(lat, lon)?;

    Ok(WalkScoreQuery { address, lat, lon })
}
