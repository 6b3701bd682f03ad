//! queuectl worker process.
//!
//! Loads configuration, connects to the shared job store, and runs the
//! worker loop until SIGTERM or SIGINT.

use std::sync::Arc;

use tracing_subscriber::{EnvFilter, fmt};

use queuectl_core::config::{AppConfig, DEFAULT_CONFIG_PATH};
use queuectl_core::error::AppError;
use queuectl_database::{JobStore, PostgresJobStore};
use queuectl_worker::{JobQueue, WorkerRunner, install_shutdown_handler};

#[tokio::main]
async fn main() {
    let config = match load_configuration() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load configuration: {e}");
            std::process::exit(1);
        }
    };

    init_logging(&config);

    if let Err(e) = run(config).await {
        tracing::error!("Worker error: {e}");
        std::process::exit(1);
    }
}

/// Load configuration from file and environment
fn load_configuration() -> Result<AppConfig, AppError> {
    let config_path =
        std::env::var("QUEUECTL_CONFIG").unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
    let env = std::env::var("QUEUECTL_ENV").unwrap_or_else(|_| "development".to_string());

    AppConfig::load_with(&config_path, &env)
}

/// Initialize tracing/logging
fn init_logging(config: &AppConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.logging.level));

    match config.logging.format.as_str() {
        "json" => {
            fmt()
                .json()
                .with_env_filter(filter)
                .with_target(true)
                .with_thread_ids(true)
                .init();
        }
        _ => {
            fmt()
                .pretty()
                .with_env_filter(filter)
                .with_target(true)
                .init();
        }
    }
}

async fn run(config: AppConfig) -> Result<(), AppError> {
    tracing::info!("Starting queuectl worker v{}", env!("CARGO_PKG_VERSION"));

    let store: Arc<dyn JobStore> = Arc::new(PostgresJobStore::connect(&config.database).await?);
    let queue = Arc::new(JobQueue::new(store));
    let runner = WorkerRunner::new(queue, config.worker);

    let shutdown = install_shutdown_handler()?;
    runner.run(shutdown).await;

    Ok(())
}
