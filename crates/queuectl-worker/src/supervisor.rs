//! Starting and stopping detached worker processes.

use std::path::{Path, PathBuf};
use std::process::Stdio;

use tracing::{debug, info, warn};

use queuectl_core::config::WorkerConfig;
use queuectl_core::error::AppError;
use queuectl_core::result::AppResult;

/// Name of the worker executable installed next to the CLI.
pub const WORKER_BINARY: &str = "queuectl-worker";

/// Spawns worker processes and tracks them through a PID file.
#[derive(Debug, Clone)]
pub struct WorkerSupervisor {
    binary: PathBuf,
    pid_file: PathBuf,
}

impl WorkerSupervisor {
    /// Create a supervisor for an explicit binary and PID file.
    pub fn new(binary: impl Into<PathBuf>, pid_file: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
            pid_file: pid_file.into(),
        }
    }

    /// Use `config.binary`, or the worker binary next to the running
    /// executable.
    pub fn from_config(config: &WorkerConfig) -> AppResult<Self> {
        let binary = match &config.binary {
            Some(path) => PathBuf::from(path),
            None => {
                let current = std::env::current_exe().map_err(|e| {
                    AppError::internal(format!("Cannot locate current executable: {e}"))
                })?;
                current.with_file_name(WORKER_BINARY)
            }
        };
        Ok(Self::new(binary, &config.pid_file))
    }

    /// Path of the PID file
    pub fn pid_file(&self) -> &Path {
        &self.pid_file
    }

    /// Spawn `count` detached workers and record their PIDs.
    ///
    /// If a spawn fails, the workers already running are still recorded so
    /// `stop` can reach them.
    pub async fn start(&self, count: usize) -> AppResult<Vec<u32>> {
        self.start_with(count, || self.spawn_one()).await
    }

    async fn start_with<F>(&self, count: usize, mut spawn: F) -> AppResult<Vec<u32>>
    where
        F: FnMut() -> AppResult<u32>,
    {
        let mut pids = Vec::with_capacity(count);

        for _ in 0..count {
            match spawn() {
                Ok(pid) => {
                    debug!(pid, "Worker process spawned");
                    pids.push(pid);
                }
                Err(e) => {
                    if !pids.is_empty() {
                        self.write_pids(&pids).await?;
                        warn!(
                            started = pids.len(),
                            requested = count,
                            "Worker start aborted; recorded the workers already running"
                        );
                    }
                    return Err(e);
                }
            }
        }

        self.write_pids(&pids).await?;
        info!(count = pids.len(), pid_file = %self.pid_file.display(), "Workers started");
        Ok(pids)
    }

    fn spawn_one(&self) -> AppResult<u32> {
        let mut command = std::process::Command::new(&self.binary);
        command
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null());

        #[cfg(unix)]
        {
            use std::os::unix::process::CommandExt;
            command.process_group(0);
        }

        let child = command.spawn().map_err(|e| {
            AppError::internal(format!(
                "Failed to start worker '{}': {e}",
                self.binary.display()
            ))
        })?;
        Ok(child.id())
    }

    async fn write_pids(&self, pids: &[u32]) -> AppResult<()> {
        let contents = pids
            .iter()
            .map(u32::to_string)
            .collect::<Vec<_>>()
            .join("\n");
        tokio::fs::write(&self.pid_file, contents).await?;
        Ok(())
    }

    /// Send SIGTERM to every recorded worker and remove the PID file.
    ///
    /// Returns the PIDs that were signalled; an absent PID file is a no-op.
    pub async fn stop(&self) -> AppResult<Vec<u32>> {
        let contents = match tokio::fs::read_to_string(&self.pid_file).await {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let pids = parse_pids(&contents);
        for pid in &pids {
            let status = tokio::process::Command::new("kill")
                .arg("-TERM")
                .arg(pid.to_string())
                .stdout(Stdio::null())
                .stderr(Stdio::null())
                .status()
                .await;
            match status {
                Ok(s) if s.success() => debug!(pid, "Sent SIGTERM"),
                _ => warn!(pid, "Worker not signalled (already gone?)"),
            }
        }

        tokio::fs::remove_file(&self.pid_file).await?;
        info!(count = pids.len(), "Workers stopped");
        Ok(pids)
    }
}

/// Parse a PID file: one PID per line, blank or malformed lines skipped.
pub fn parse_pids(contents: &str) -> Vec<u32> {
    contents
        .lines()
        .filter_map(|line| line.trim().parse().ok())
        .collect()
}
