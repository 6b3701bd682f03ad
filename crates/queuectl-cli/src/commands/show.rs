//! Job detail command.

use clap::Args;

use queuectl_core::config::AppConfig;
use queuectl_core::result::AppResult;

use crate::output::{self, OutputFormat};

/// Arguments for `show`
#[derive(Debug, Args)]
pub struct ShowArgs {
    /// Job id or unique id prefix
    pub id: String,
}

/// Show one job, including its output and last error
pub async fn execute(args: &ShowArgs, config: &AppConfig, format: OutputFormat) -> AppResult<()> {
    let queue = super::connect_queue(config).await?;
    let job = queue.resolve(&args.id).await?;

    if format == OutputFormat::Json {
        output::print_json(&job);
        return Ok(());
    }

    println!("\nJob {}\n", job.id);
    output::print_kv("Command", &job.command);
    output::print_kv("State", &job.state.as_str().to_uppercase());
    output::print_kv("Attempts", &format!("{}/{}", job.attempts, job.max_retries));
    output::print_kv("Priority", &job.priority.to_string());
    output::print_kv("Timeout", &format!("{}ms", job.timeout_ms));
    if let Some(run_at) = job.run_at {
        output::print_kv("Run At", &run_at.to_rfc3339());
    }
    if let Some(next) = job.next_retry_at {
        output::print_kv("Next Retry", &next.to_rfc3339());
    }
    if let Some(worker) = &job.locked_by {
        output::print_kv("Locked By", worker);
    }
    if let Some(duration) = job.duration_ms {
        output::print_kv("Duration", &format!("{:.2}s", duration as f64 / 1000.0));
    }
    if let Some(out) = &job.output {
        println!("\nOutput:\n{out}");
    }
    if let Some(err) = &job.error {
        println!("\nError:\n{err}");
    }
    println!();
    Ok(())
}
