//! Job submission command.

use chrono::{DateTime, Utc};
use clap::Args;
use serde::Deserialize;
use validator::Validate;

use queuectl_core::config::AppConfig;
use queuectl_core::error::AppError;
use queuectl_core::result::AppResult;
use queuectl_entity::job::NewJob;

use crate::output::{self, OutputFormat};

/// Arguments for `enqueue`
#[derive(Debug, Args)]
pub struct EnqueueArgs {
    /// Job description, e.g. '{"command":"echo hi","max_retries":2}'
    pub job: String,
}

/// JSON job description accepted on the command line.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct JobInput {
    /// Client-supplied id
    #[validate(length(min = 1, message = "Job id cannot be empty"))]
    pub id: Option<String>,
    /// Shell command
    #[validate(length(min = 1, message = "Command cannot be empty"))]
    pub command: String,
    /// Retry ceiling
    #[validate(range(min = 0, max = 10))]
    pub max_retries: Option<i32>,
    /// Scheduling priority
    #[validate(range(min = 0, max = 100))]
    pub priority: Option<i32>,
    /// Timeout in milliseconds
    #[validate(range(min = 1000))]
    pub timeout: Option<i64>,
    /// Earliest start time (RFC 3339)
    pub run_at: Option<DateTime<Utc>>,
}

impl JobInput {
    /// Parse and validate a JSON description.
    pub fn parse(raw: &str) -> AppResult<Self> {
        let input: Self = serde_json::from_str(raw)
            .map_err(|e| AppError::validation(format!("Invalid job JSON: {e}")))?;

        if let Err(errors) = input.validate() {
            if errors.field_errors().contains_key("command") {
                return Err(AppError::invalid_command());
            }
            return Err(AppError::validation(errors.to_string()));
        }
        Ok(input)
    }

    /// Fill omitted fields from the submission defaults.
    pub fn into_new_job(self) -> NewJob {
        let mut new = NewJob::new(self.command);
        new.id = self.id;
        new.run_at = self.run_at;
        if let Some(max_retries) = self.max_retries {
            new.max_retries = max_retries;
        }
        if let Some(priority) = self.priority {
            new.priority = priority;
        }
        if let Some(timeout) = self.timeout {
            new.timeout_ms = timeout;
        }
        new
    }
}

/// Validate and enqueue a job
pub async fn execute(args: &EnqueueArgs, config: &AppConfig, format: OutputFormat) -> AppResult<()> {
    let new = JobInput::parse(&args.job)?.into_new_job();
    let queue = super::connect_queue(config).await?;
    let job = queue.enqueue(new).await?;

    match format {
        OutputFormat::Json => output::print_json(&job),
        OutputFormat::Table => output::print_success(&format!("Job {} enqueued", job.id)),
    }
    Ok(())
}
