//! Application routing configuration with middleware stack.
//!
//! # Middleware Stack (applied in order)
//!
//! ```text
//! Request
//!    │
//!    ▼
//! ┌──────────────────┐
//! │   Request ID     │ ← Sets and echoes X-Request-Id
//! └────────┬─────────┘
//!          │
//!          ▼
//! ┌──────────────────┐
//! │      CORS        │ ← Cross-origin headers, answers preflights
//! └────────┬─────────┘
//!          │
//!          ▼
//! ┌──────────────────┐
//! │  JSON Body Parse │ ← 400 on malformed JSON, 413 if too large
//! └────────┬─────────┘
//!          │
//!          ▼
//! ┌──────────────────┐
//! │ Tracing/Metrics  │ ← Request/response logging and counters
//! └────────┬─────────┘
//!          │
//!          ▼
//! ┌──────────────────┐
//! │  Auth Context    │ ← Decodes an optional bearer token, never rejects
//! └────────┬─────────┘
//!          │
//!          ▼
//!   Handler or 404 fallback
//! ```
//!
//! Every failure along the way is an [`AppError`](crate::error::AppError)
//! and leaves as the same JSON envelope.
//!
//! # Route Groups
//!
//! - `/health` - Liveness
//! - `/auth` - Token issuing and identity echo
//! - `/user` - Per-user preferences
//! - `/api/weather/{city}`, `/getwalkscore` - Weather and Walk Score proxies
//! - `/api/city/{cityName}/scores` - Teleport city scores proxy

use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::middleware::{from_fn, from_fn_with_state};
use axum::routing::{get, post};
use tower_http::cors::{Any, CorsLayer};
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use crate::handlers;
use crate::metrics::track_requests;
use crate::middleware::{AuthContextLayer, parse_json_body};
use crate::state::AppState;

/// Build the application router with all routes and middleware configured.
///
/// # Arguments
///
/// * `state` - Application state containing config, upstream clients and services
///
/// # Returns
///
/// Fully configured Axum router ready to be served.
pub fn build_router(state: AppState) -> Router {
    let config = &state.config;

    let cors = build_cors_layer(&config.cors_allowed_origins);
    let max_body = config.max_request_body_size;

    // =========================================================================
    // Build Router with Routes
    // =========================================================================
    let auth_routes = Router::new()
        .route("/token", post(handlers::issue_token))
        .route("/me", get(handlers::me));

    let user_routes = Router::new().route(
        "/preferences",
        get(handlers::get_preferences)
            .put(handlers::put_preferences)
            .delete(handlers::delete_preferences),
    );

    let mut router = Router::new()
        .route("/health", get(handlers::health_check))
        .nest("/auth", auth_routes)
        .nest("/user", user_routes)
        .route("/api/weather/{city}", get(handlers::current_weather))
        .route("/getwalkscore", get(handlers::walkscore))
        .route("/api/city/{cityName}/scores", get(handlers::city_scores))
        // A known path with an unknown method is still "not found" here
        .method_not_allowed_fallback(handlers::not_found)
        .fallback(handlers::not_found);

    // =========================================================================
    // Apply Middleware Stack (order matters - applied bottom to top)
    // =========================================================================

    // 1. Auth context, closest to the handlers
    router = router.layer(AuthContextLayer::new());

    // 2. Request logging and metrics
    router = router
        .layer(from_fn(track_requests))
        .layer(TraceLayer::new_for_http());

    // 3. JSON body parsing (runs before routing, so unmatched paths are covered)
    info!(max_bytes = max_body, "Request body size limit configured");
    router = router
        .layer(from_fn_with_state(max_body, parse_json_body))
        .layer(DefaultBodyLimit::max(max_body));

    // 4. CORS
    router = router.layer(cors);

    // 5. Request ID, outermost so every response carries it
    router = router
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid));

    router.with_state(state)
}

/// Build CORS layer from configuration.
///
/// # Arguments
///
/// * `allowed_origins` - List of allowed origins, or `["*"]` for any origin
///
/// Origins that are not valid header values are skipped with a warning.
fn build_cors_layer(allowed_origins: &[String]) -> CorsLayer {
    let allow_any = allowed_origins.iter().any(|o| o == "*");

    if allow_any {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        let origins: Vec<_> = allowed_origins
            .iter()
            .filter_map(|o| match o.parse() {
                Ok(origin) => Some(origin),
                Err(_) => {
                    warn!(origin = %o, "Ignoring invalid CORS origin");
                    None
                }
            })
            .collect();

        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods(Any)
            .allow_headers(Any)
    }
}
