//! Table and JSON output formatting for CLI commands.

use serde::Serialize;
use tabled::{Table, Tabled};

use queuectl_entity::job::{Job, JobState, QueueStats};

/// Output format selection
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// Human-readable table
    #[default]
    Table,
    /// JSON output
    Json,
}

/// One row of `queuectl list`.
#[derive(Debug, Tabled)]
pub struct JobRow {
    /// Short id
    #[tabled(rename = "ID")]
    pub id: String,
    /// Truncated command
    #[tabled(rename = "Command")]
    pub command: String,
    /// Current state
    #[tabled(rename = "State")]
    pub state: String,
    /// `attempts/max_retries`
    #[tabled(rename = "Attempts")]
    pub attempts: String,
}

impl From<&Job> for JobRow {
    fn from(job: &Job) -> Self {
        Self {
            id: truncate(&job.id, 8),
            command: truncate(&job.command, 30),
            state: job.state.as_str().to_uppercase(),
            attempts: format!("{}/{}", job.attempts, job.max_retries),
        }
    }
}

/// One row of `queuectl dlq list`.
#[derive(Debug, Tabled)]
pub struct DeadJobRow {
    /// Short id
    #[tabled(rename = "ID")]
    pub id: String,
    /// Truncated command
    #[tabled(rename = "Command")]
    pub command: String,
    /// Truncated last error
    #[tabled(rename = "Error")]
    pub error: String,
}

impl From<&Job> for DeadJobRow {
    fn from(job: &Job) -> Self {
        Self {
            id: truncate(&job.id, 8),
            command: truncate(&job.command, 30),
            error: truncate(job.error.as_deref().unwrap_or("Unknown"), 40),
        }
    }
}

/// One row of `queuectl status`.
#[derive(Debug, Tabled)]
pub struct StateRow {
    /// State name
    #[tabled(rename = "State")]
    pub state: String,
    /// Job count
    #[tabled(rename = "Count")]
    pub count: i64,
    /// Share of total
    #[tabled(rename = "%")]
    pub percentage: String,
}

/// Per-state rows in display order.
pub fn state_rows(stats: &QueueStats) -> Vec<StateRow> {
    JobState::ALL
        .iter()
        .map(|state| StateRow {
            state: state.as_str().to_uppercase(),
            count: stats.count(*state),
            percentage: format!("{:.1}%", stats.percentage(*state)),
        })
        .collect()
}

/// Keep at most `max` characters.
pub fn truncate(value: &str, max: usize) -> String {
    value.chars().take(max).collect()
}

/// Print rows as a table, or `empty` when there are none
pub fn print_table<T: Tabled>(rows: &[T], empty: &str) {
    if rows.is_empty() {
        println!("{empty}");
    } else {
        println!("{}", Table::new(rows));
    }
}

/// Print any serializable value as pretty JSON
pub fn print_json<T: Serialize + ?Sized>(value: &T) {
    let json = serde_json::to_string_pretty(value).unwrap_or_else(|_| "null".to_string());
    println!("{json}");
}

/// Print a success message
pub fn print_success(msg: &str) {
    println!("✓ {msg}");
}

/// Print a key-value pair
pub fn print_kv(key: &str, value: &str) {
    println!("  {:<12} {}", format!("{key}:"), value);
}
