//! Job listing command.

use clap::Args;

use queuectl_core::config::AppConfig;
use queuectl_core::result::AppResult;

use crate::output::{self, JobRow, OutputFormat};

/// Arguments for `list`
#[derive(Debug, Args)]
pub struct ListArgs {
    /// Only jobs in this state (case-insensitive)
    #[arg(short, long)]
    pub state: Option<String>,
}

/// List jobs, newest first
pub async fn execute(args: &ListArgs, config: &AppConfig, format: OutputFormat) -> AppResult<()> {
    let queue = super::connect_queue(config).await?;
    let jobs = queue.list(args.state.as_deref()).await?;

    match format {
        OutputFormat::Json => output::print_json(&jobs),
        OutputFormat::Table => {
            let rows: Vec<JobRow> = jobs.iter().map(JobRow::from).collect();
            output::print_table(&rows, "No jobs found");
        }
    }
    Ok(())
}
