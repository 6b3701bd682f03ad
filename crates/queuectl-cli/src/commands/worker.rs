//! Worker management CLI commands.

use std::sync::Arc;

use clap::{Args, Subcommand};

use queuectl_core::config::AppConfig;
use queuectl_core::result::AppResult;
use queuectl_worker::{WorkerRunner, WorkerSupervisor, install_shutdown_handler};

use crate::output;

/// Arguments for worker commands
#[derive(Debug, Args)]
pub struct WorkerArgs {
    /// Worker subcommand
    #[command(subcommand)]
    pub command: WorkerCommand,
}

/// Worker subcommands
#[derive(Debug, Subcommand)]
pub enum WorkerCommand {
    /// Start detached worker processes
    Start {
        /// Number of workers
        #[arg(short = 'n', long, default_value_t = 1)]
        count: usize,
    },
    /// Stop all workers started with `worker start`
    Stop,
    /// Run one worker in the foreground
    Run,
}

/// Execute worker commands
pub async fn execute(args: &WorkerArgs, config: &AppConfig) -> AppResult<()> {
    match &args.command {
        WorkerCommand::Start { count } => {
            let supervisor = WorkerSupervisor::from_config(&config.worker)?;
            let pids = supervisor.start(*count).await?;
            output::print_success(&format!("Started {} worker(s)", pids.len()));
            for (i, pid) in pids.iter().enumerate() {
                println!("  Worker {} (PID: {pid})", i + 1);
            }
        }
        WorkerCommand::Stop => {
            let supervisor = WorkerSupervisor::from_config(&config.worker)?;
            let pids = supervisor.stop().await?;
            output::print_success(&format!("Workers stopped ({} signalled)", pids.len()));
        }
        WorkerCommand::Run => {
            let queue = super::connect_queue(config).await?;
            let runner = WorkerRunner::new(Arc::clone(&queue), config.worker.clone());
            println!("Worker {} started", runner.worker_id());
            runner.run(install_shutdown_handler()?).await;
            println!("Worker {} stopped", runner.worker_id());
        }
    }

    Ok(())
}
