//! Dead letter queue commands.

use clap::{Args, Subcommand};

use queuectl_core::config::AppConfig;
use queuectl_core::result::AppResult;

use crate::output::{self, DeadJobRow, OutputFormat};

/// Arguments for DLQ commands
#[derive(Debug, Args)]
pub struct DlqArgs {
    /// DLQ subcommand
    #[command(subcommand)]
    pub command: DlqCommand,
}

/// DLQ subcommands
#[derive(Debug, Subcommand)]
pub enum DlqCommand {
    /// View dead jobs
    List,
    /// Move a dead job back to pending
    Retry {
        /// Job id or unique id prefix
        id: String,
    },
}

/// Execute DLQ commands
pub async fn execute(args: &DlqArgs, config: &AppConfig, format: OutputFormat) -> AppResult<()> {
    let queue = super::connect_queue(config).await?;

    match &args.command {
        DlqCommand::List => {
            let jobs = queue.dead_letters().await?;
            match format {
                OutputFormat::Json => output::print_json(&jobs),
                OutputFormat::Table => {
                    let rows: Vec<DeadJobRow> = jobs.iter().map(DeadJobRow::from).collect();
                    if !rows.is_empty() {
                        println!("\nDead Letter Queue\n");
                    }
                    output::print_table(&rows, "DLQ is empty");
                }
            }
        }
        DlqCommand::Retry { id } => {
            let job = queue.requeue(id).await?;
            match format {
                OutputFormat::Json => output::print_json(&job),
                OutputFormat::Table => output::print_success(&format!("Job {} back in queue", job.id)),
            }
        }
    }

    Ok(())
}
