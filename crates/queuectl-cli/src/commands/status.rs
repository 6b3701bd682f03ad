//! Queue status command.

use queuectl_core::config::AppConfig;
use queuectl_core::result::AppResult;

use crate::output::{self, OutputFormat};

/// Print per-state counts, total, and average duration
pub async fn execute(config: &AppConfig, format: OutputFormat) -> AppResult<()> {
    let queue = super::connect_queue(config).await?;
    let stats = queue.stats().await?;

    match format {
        OutputFormat::Json => output::print_json(&stats),
        OutputFormat::Table => {
            println!("\nQueue Status\n");
            output::print_table(&output::state_rows(&stats), "No jobs");
            println!("\nTotal: {} jobs", stats.total);
            if stats.avg_duration_ms > 0.0 {
                println!("Avg Duration: {:.2}s", stats.avg_duration_ms / 1000.0);
            }
            println!();
        }
    }
    Ok(())
}
