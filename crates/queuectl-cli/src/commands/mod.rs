//! CLI command definitions and dispatch.

pub mod config;
pub mod dashboard;
pub mod dlq;
pub mod enqueue;
pub mod list;
pub mod migrate;
pub mod show;
pub mod status;
pub mod worker;

use std::sync::Arc;

use clap::{Parser, Subcommand};

use queuectl_core::config::{AppConfig, DEFAULT_CONFIG_PATH};
use queuectl_core::result::AppResult;
use queuectl_database::{JobStore, PostgresJobStore};
use queuectl_worker::JobQueue;

use crate::output::OutputFormat;

/// queuectl: durable shell job queue with retries and a dead letter queue
#[derive(Debug, Parser)]
#[command(name = "queuectl", version, about, long_about = None)]
pub struct Cli {
    /// Base path of the configuration file
    #[arg(short, long, global = true, default_value = DEFAULT_CONFIG_PATH)]
    pub config: String,

    /// Output format
    #[arg(short, long, global = true, value_enum, default_value = "table")]
    pub format: OutputFormat,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level commands
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Add a new job from a JSON description
    Enqueue(enqueue::EnqueueArgs),
    /// Manage worker processes
    Worker(worker::WorkerArgs),
    /// Show queue status
    Status,
    /// List jobs
    List(list::ListArgs),
    /// Show job details and output
    Show(show::ShowArgs),
    /// Manage the dead letter queue
    Dlq(dlq::DlqArgs),
    /// Manage runtime configuration
    Config(config::ConfigArgs),
    /// Start the reporting dashboard
    Dashboard,
    /// Apply database migrations
    Migrate,
}

impl Cli {
    /// Execute the CLI command
    pub async fn execute(&self) -> AppResult<()> {
        let config = load_config(&self.config)?;

        match &self.command {
            Commands::Enqueue(args) => enqueue::execute(args, &config, self.format).await,
            Commands::Worker(args) => worker::execute(args, &config).await,
            Commands::Status => status::execute(&config, self.format).await,
            Commands::List(args) => list::execute(args, &config, self.format).await,
            Commands::Show(args) => show::execute(args, &config, self.format).await,
            Commands::Dlq(args) => dlq::execute(args, &config, self.format).await,
            Commands::Config(args) => config::execute(args, &config, self.format).await,
            Commands::Dashboard => dashboard::execute(&config).await,
            Commands::Migrate => migrate::execute(&config).await,
        }
    }
}

/// Helper: load configuration from `path` plus the `QUEUECTL_ENV` overlay
pub fn load_config(path: &str) -> AppResult<AppConfig> {
    let env = std::env::var("QUEUECTL_ENV").unwrap_or_else(|_| "development".to_string());
    AppConfig::load_with(path, &env)
}

/// Helper: connect to the shared store and wrap it in a queue service
pub async fn connect_queue(config: &AppConfig) -> AppResult<Arc<JobQueue>> {
    let store: Arc<dyn JobStore> = Arc::new(PostgresJobStore::connect(&config.database).await?);
    Ok(Arc::new(JobQueue::new(store)))
}
