//! Bounded-time shell command execution.

use std::process::Stdio;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use tokio::process::Command;
use tracing::{debug, warn};

/// How one execution ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionStatus {
    /// Exit code 0.
    Succeeded,
    /// Non-zero exit code.
    Failed,
    /// Killed after exceeding the timeout.
    TimedOut,
    /// The process could not be started or awaited.
    LaunchFailed,
}

/// Structured result of one command execution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionResult {
    /// Outcome category.
    pub status: ExecutionStatus,
    /// Captured stdout (empty unless the process ran to completion).
    pub output: String,
    /// Failure message; `None` on success.
    pub error: Option<String>,
    /// Process exit code, when one was observed.
    pub exit_code: Option<i32>,
    /// Wall-clock time spent, in milliseconds.
    pub duration_ms: i64,
}

impl ExecutionResult {
    /// Whether the command exited with code 0.
    pub fn is_success(&self) -> bool {
        self.status == ExecutionStatus::Succeeded
    }

    fn failure(status: ExecutionStatus, error: String, started: Instant) -> Self {
        Self {
            status,
            output: String::new(),
            error: Some(error),
            exit_code: None,
            duration_ms: elapsed_ms(started),
        }
    }
}

/// Runs job commands through `sh -c`.
#[derive(Debug, Clone)]
pub struct CommandExecutor {
    shell: String,
}

impl CommandExecutor {
    /// Create an executor using `/bin/sh`.
    pub fn new() -> Self {
        Self::with_shell("sh")
    }

    /// Create an executor using a specific shell binary.
    pub fn with_shell(shell: impl Into<String>) -> Self {
        Self {
            shell: shell.into(),
        }
    }

    /// Split `command` on whitespace and rejoin the tokens for the shell.
    pub fn normalize(command: &str) -> Option<String> {
        let tokens: Vec<&str> = command.split_whitespace().collect();
        if tokens.is_empty() {
            None
        } else {
            Some(tokens.join(" "))
        }
    }

    /// Run `command`, killing it if it outlives `timeout`.
    ///
    /// Exactly one result is produced: the timer and the process exit race
    /// inside a single `timeout` future, and dropping the losing wait kills
    /// the child.
    pub async fn execute(&self, command: &str, timeout: Duration) -> ExecutionResult {
        let started = Instant::now();

        let Some(line) = Self::normalize(command) else {
            return ExecutionResult::failure(
                ExecutionStatus::LaunchFailed,
                "Command cannot be empty".to_string(),
                started,
            );
        };

        let child = Command::new(&self.shell)
            .arg("-c")
            .arg(&line)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn();

        let child = match child {
            Ok(child) => child,
            Err(e) => {
                warn!(command = %line, error = %e, "Failed to launch command");
                return ExecutionResult::failure(
                    ExecutionStatus::LaunchFailed,
                    e.to_string(),
                    started,
                );
            }
        };

        match tokio::time::timeout(timeout, child.wait_with_output()).await {
            Ok(Ok(output)) => {
                let duration_ms = elapsed_ms(started);
                let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
                let stderr = String::from_utf8_lossy(&output.stderr).into_owned();
                let exit_code = output.status.code();

                debug!(command = %line, exit_code = ?exit_code, duration_ms, "Command exited");

                if output.status.success() {
                    ExecutionResult {
                        status: ExecutionStatus::Succeeded,
                        output: stdout,
                        error: None,
                        exit_code,
                        duration_ms,
                    }
                } else {
                    let error = if stderr.is_empty() {
                        match exit_code {
                            Some(code) => format!("Exit code {code}"),
                            None => "Terminated by signal".to_string(),
                        }
                    } else {
                        stderr
                    };
                    ExecutionResult {
                        status: ExecutionStatus::Failed,
                        output: stdout,
                        error: Some(error),
                        exit_code,
                        duration_ms,
                    }
                }
            }
            Ok(Err(e)) => ExecutionResult::failure(
                ExecutionStatus::LaunchFailed,
                format!("Failed to wait for command: {e}"),
                started,
            ),
            Err(_) => {
                warn!(command = %line, timeout_ms = timeout.as_millis() as u64, "Command timed out");
                ExecutionResult::failure(
                    ExecutionStatus::TimedOut,
                    format!("Job timed out after {}ms", timeout.as_millis()),
                    started,
                )
            }
        }
    }
}

impl Default for CommandExecutor {
    fn default() -> Self {
        Self::new()
    }
}

fn elapsed_ms(started: Instant) -> i64 {
    started.elapsed().as_millis() as i64
}
