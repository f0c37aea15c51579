use tokio::signal;
use tracing::info;

/// Resolves when the process is asked to stop (Ctrl+C or SIGTERM);
/// `axum::serve` drains in-flight requests before returning.
pub async fn signal() {
    let interrupt = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
        "interrupt"
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
        "SIGTERM"
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<&str>();

    let cause = tokio::select! {
        cause = interrupt => cause,
        cause = terminate => cause,
    };

    info!(signal = cause, "Shutdown requested");
}
