use axum::Json;
use axum::extract::State;
use tracing::instrument;

use crate::error::AppResult;
use crate::middleware::{JsonBody, VerifiedUser};
use crate::models::{MeResponse, TokenRequest, TokenResponse};
use crate::state::AppState;
use crate::validation::validate_username;

/// Issue a bearer token for a username.
#[instrument(skip_all)]
pub async fn issue_token(
    State(state): State<AppState>,
    JsonBody(request): JsonBody<TokenRequest>,
) -> AppResult<Json<TokenResponse>> {
    validate_username(&request.username)?;
    let issued = state.tokens.issue(&request.username)?;
    Ok(Json(issued))
}

/// Return the claims of the caller's verified bearer token.
#[instrument(skip_all, fields(user_id = user.id()))]
pub async fn me(user: VerifiedUser) -> Json<MeResponse> {
    Json(MeResponse {
        user_id: user.id().to_string(),
        claims: user.claims().clone(),
    })
}
