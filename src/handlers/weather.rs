use axum::extract::rejection::{PathRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use tracing::{instrument, warn};

use crate::error::{AppError, AppResult};
use crate::middleware::VerifiedUser;
use crate::models::{Units, WeatherParams};
use crate::state::AppState;
use crate::upstream::{UpstreamError, UpstreamJson};
use crate::validation::validate_location;

pub const WEATHER_NOT_FOUND: &str = "Weather data not found for this location.";

/// Current weather for a city, proxied from OpenWeatherMap.
///
/// Units come from the `units` query parameter, else from the stored
/// preferences of a verified caller, else metric.
#[instrument(skip_all)]
pub async fn current_weather(
    State(state): State<AppState>,
    user: Option<VerifiedUser>,
    city: Result<Path<String>, PathRejection>,
    params: Result<Query<WeatherParams>, QueryRejection>,
) -> AppResult<UpstreamJson> {
    let Path(city) = city?;
    let Query(params) = params?;
    validate_location(&city, "city")?;

    let units = resolve_units(&state, user.as_ref(), params.units).await;

    state
        .weather
        .current(&city, units)
        .await
        .map_err(|e| match e {
            UpstreamError::NotFound { .. } => AppError::NotFound(WEATHER_NOT_FOUND.to_string()),
            other => {
                warn!(error = %other, city = %city, "Error fetching weather");
                other.into()
            }
        })
}

async fn resolve_units(
    state: &AppState,
    user: Option<&VerifiedUser>,
    requested: Option<Units>,
) -> Units {
    if let Some(units) = requested {
        return units;
    }

    match user {
        Some(user) => state.preferences.get_or_default(user.id()).await.units,
        None => Units::default(),
    }
}
