//! Application state shared across all handlers and middleware.

use std::sync::Arc;

use queuectl_core::config::DashboardConfig;
use queuectl_worker::JobQueue;

/// Application state passed to every Axum handler via `State<AppState>`.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Dashboard configuration
    pub config: Arc<DashboardConfig>,
    /// Read access to the shared job store
    pub queue: Arc<JobQueue>,
}

impl AppState {
    /// Create a new application state.
    pub fn new(queue: Arc<JobQueue>, config: DashboardConfig) -> Self {
        Self {
            config: Arc::new(config),
            queue,
        }
    }
}
