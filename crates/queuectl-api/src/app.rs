//! Dashboard server bootstrap.

use std::future::Future;
use std::sync::Arc;

use axum::Router;
use tracing::info;

use queuectl_core::config::DashboardConfig;
use queuectl_core::error::AppError;
use queuectl_core::result::AppResult;
use queuectl_worker::JobQueue;

use crate::router::build_router;
use crate::state::AppState;

/// Build the reporting application over `queue`.
pub fn build_app(queue: Arc<JobQueue>, config: DashboardConfig) -> Router {
    build_router(AppState::new(queue, config))
}

/// Bind and serve the dashboard until `shutdown` resolves.
pub async fn run_dashboard<F>(
    queue: Arc<JobQueue>,
    config: DashboardConfig,
    shutdown: F,
) -> AppResult<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let addr = format!("{}:{}", config.host, config.port);
    let app = build_app(queue, config);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| AppError::internal(format!("Failed to bind {addr}: {e}")))?;

    info!("Dashboard listening on http://{addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await
        .map_err(|e| AppError::internal(format!("Server error: {e}")))?;

    Ok(())
}
