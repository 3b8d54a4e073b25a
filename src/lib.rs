//! # Lamb API Gateway
//!
//! A small HTTP gateway in front of third-party city data providers:
//!
//! - **City scores**: Teleport urban-area scores by city name
//! - **Weather**: current conditions from OpenWeatherMap
//! - **Walk Score**: walk, transit and bike scores for an address
//! - **Accounts**: bearer token issuing and per-user preferences
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      Axum HTTP Server                       │
//! ├─────────────────────────────────────────────────────────────┤
//! │  Middleware (Request ID → CORS → Body → Trace → Auth)       │
//! ├─────────────────────────────────────────────────────────────┤
//! │  Handlers (health, auth, preferences, city, weather, walk)  │
//! ├─────────────────────────────────────────────────────────────┤
//! │  Services (PreferenceService, TokenService)                 │
//! ├─────────────────────────────────────────────────────────────┤
//! │  Upstream clients (reqwest, bounded timeout)                │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every failure, wherever it happens, reaches the client as
//! `{"error": {"message": ..., "status": ...}}`.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use lamb_api::{AppState, Config, build_router};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::from_env()?;
//!     let addr = config.server_addr();
//!     let app = build_router(AppState::new(config)?);
//!
//!     let listener = tokio::net::TcpListener::bind(addr).await?;
//!     axum::serve(listener, app).await?;
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;
pub mod upstream;
pub mod utils;
pub mod validation;

// Re-exports for convenience
pub use config::Config;
pub use error::{AppError, AppResult, ErrorKind, make_error};
pub use middleware::{AuthContext, VerifiedUser};
pub use routes::build_router;
pub use state::AppState;
