use std::net::SocketAddr;
use std::process::ExitCode;

use tokio::net::TcpListener;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use lamb_api::{AppState, Config, build_router, metrics, utils};

#[tokio::main]
async fn main() -> ExitCode {
    // Configuration comes first: it decides the log level and format
    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            init_logging("info", false);
            error!("Configuration error: {e}");
            return ExitCode::from(exitcode::CONFIG as u8);
        }
    };

    init_logging(&config.log_level, config.log_json);

    info!("Starting Lamb API v{}", env!("CARGO_PKG_VERSION"));

    match run(config).await {
        Ok(()) => ExitCode::from(exitcode::OK as u8),
        Err(exit_code) => ExitCode::from(exit_code as u8),
    }
}

fn init_logging(level: &str, json: bool) {
    let filter = EnvFilter::try_new(level).unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true);

    if json {
        builder.json().init();
    } else {
        builder.with_thread_ids(true).init();
    }
}

/// Run the application, returning an exit code on error.
async fn run(config: Config) -> Result<(), exitcode::ExitCode> {
    info!(
        host = %config.host,
        port = %config.port,
        upstream_timeout_secs = config.upstream_timeout.as_secs(),
        cors_origins = ?config.cors_allowed_origins,
        "Configuration loaded"
    );

    if let Some(metrics_addr) = config.metrics_addr() {
        metrics::try_init_metrics(metrics_addr);
    }

    let addr: SocketAddr = config.server_addr().parse().map_err(|e| {
        error!("Invalid server address: {e}");
        exitcode::CONFIG
    })?;

    let state = AppState::new(config).map_err(|e| {
        error!("Failed to build application state: {e}");
        exitcode::SOFTWARE
    })?;
    let app = build_router(state);

    let listener = TcpListener::bind(addr).await.map_err(|e| {
        error!("Failed to bind to {addr}: {e}");
        exitcode::UNAVAILABLE
    })?;

    info!("Server listening on http://{addr}");
    info!("API endpoints:");
    info!("  GET    /health                      - Health check");
    info!("  POST   /auth/token                  - Issue a bearer token");
    info!("  GET    /auth/me                     - Decoded caller identity");
    info!("  GET    /user/preferences            - Read preferences");
    info!("  PUT    /user/preferences            - Replace preferences");
    info!("  DELETE /user/preferences            - Forget preferences");
    info!("  GET    /api/weather/{{city}}          - Current weather");
    info!("  GET    /getwalkscore                - Walk Score for an address");
    info!("  GET    /api/city/{{cityName}}/scores  - Teleport city scores");

    axum::serve(listener, app)
        .with_graceful_shutdown(utils::shutdown_signal())
        .await
        .map_err(|e| {
            error!("Server error: {e}");
            exitcode::SOFTWARE
        })?;

    info!("Server shutdown complete");
    Ok(())
}
