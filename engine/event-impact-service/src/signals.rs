//! Signal handling for graceful shutdown

use anyhow::Result;
use tokio::sync::oneshot;
use tracing::{error, info};

/// Resolve the returned receiver on Ctrl+C (SIGINT) or, on Unix, SIGTERM
pub fn setup_signal_handlers() -> Result<oneshot::Receiver<()>> {
    let (shutdown_tx, shutdown_rx) = oneshot::channel();

    #[cfg(unix)]
    let mut sigterm = tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())?;

    tokio::spawn(async move {
        #[cfg(unix)]
        let terminate = async {
            sigterm.recv().await;
        };
        #[cfg(not(unix))]
        let terminate = std::future::pending::<()>();

        tokio::select! {
            result = tokio::signal::ctrl_c() => match result {
                Ok(()) => info!("Ctrl+C signal received"),
                Err(e) => {
                    error!("Failed to listen for Ctrl+C signal: {}", e);
                    return;
                }
            },
            _ = terminate => info!("SIGTERM signal received"),
        }

        let _ = shutdown_tx.send(());
    });

    Ok(shutdown_rx)
}
