use tokio::signal;
use tracing::{error, warn};

/// Resolves on Ctrl+C, or SIGTERM on unix. Passed to `axum::serve` so
/// in-flight requests finish before exit.
///
/// A signal source that fails to register is logged and then never fires.
pub async fn shutdown_signal() {
    let interrupt = async {
        match signal::ctrl_c().await {
            Ok(()) => "SIGINT",
            Err(e) => {
                error!(error = %e, "Ctrl+C listener unavailable");
                std::future::pending().await
            }
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
                "SIGTERM"
            }
            Err(e) => {
                error!(error = %e, "SIGTERM listener unavailable");
                std::future::pending().await
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<&'static str>();

    let received = tokio::select! {
        name = interrupt => name,
        name = terminate => name,
    };

    warn!(signal = received, "Shutdown requested, draining connections");
}
