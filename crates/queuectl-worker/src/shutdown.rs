//! Signal-driven shutdown flag for worker processes.

use tokio::sync::watch;
use tracing::info;

use queuectl_core::result::AppResult;

/// Install SIGTERM/SIGINT handlers and return a flag that turns `true`
/// when either arrives.
///
/// Must be called from within a Tokio runtime.
pub fn install_shutdown_handler() -> AppResult<watch::Receiver<bool>> {
    let (tx, rx) = watch::channel(false);

    #[cfg(unix)]
    {
        use queuectl_core::error::AppError;
        use tokio::signal::unix::{SignalKind, signal};

        let mut sigterm = signal(SignalKind::terminate())
            .map_err(|e| AppError::internal(format!("Failed to install SIGTERM handler: {e}")))?;
        let mut sigint = signal(SignalKind::interrupt())
            .map_err(|e| AppError::internal(format!("Failed to install SIGINT handler: {e}")))?;

        tokio::spawn(async move {
            tokio::select! {
                _ = sigterm.recv() => info!("Received SIGTERM, finishing current job"),
                _ = sigint.recv() => info!("Received SIGINT, finishing current job"),
            }
            let _ = tx.send(true);
        });
    }

    #[cfg(not(unix))]
    {
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                info!("Received Ctrl+C, finishing current job");
            }
            let _ = tx.send(true);
        });
    }

    Ok(rx)
}
