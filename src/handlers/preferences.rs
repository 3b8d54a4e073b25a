//! User preference endpoints.
//!
//! All routes need a bearer token signed with `JWT_SECRET` that has not
//! expired, and answer `401` otherwise. The record is keyed by the token's
//! `sub` (or `username`) claim.

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use tracing::instrument;

use crate::error::AppResult;
use crate::middleware::{JsonBody, VerifiedUser};
use crate::models::Preferences;
use crate::state::AppState;

/// Preferences of the caller, defaults if none were saved.
#[instrument(skip_all, fields(user_id = user.id()))]
pub async fn get_preferences(
    State(state): State<AppState>,
    user: VerifiedUser,
) -> Json<Preferences> {
    Json(state.preferences.get_or_default(user.id()).await)
}

/// Replace the caller's preferences.
#[instrument(skip_all, fields(user_id = user.id()))]
pub async fn put_preferences(
    State(state): State<AppState>,
    user: VerifiedUser,
    JsonBody(preferences): JsonBody<Preferences>,
) -> AppResult<Json<Preferences>> {
    let stored = state.preferences.put(user.id(), preferences).await?;
    Ok(Json(stored))
}

/// Forget the caller's preferences.
#[instrument(skip_all, fields(user_id = user.id()))]
pub async fn delete_preferences(
    State(state): State<AppState>,
    user: VerifiedUser,
) -> AppResult<StatusCode> {
    state.preferences.delete(user.id()).await?;
    Ok(StatusCode::NO_CONTENT)
}
