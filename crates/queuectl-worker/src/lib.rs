//! Job lifecycle engine for queuectl.
//!
//! This crate provides:
//! - A pure retry policy with exponential backoff and dead-lettering
//! - A command executor with a wall-clock timeout
//! - The lease protocol that lets many workers share one store
//! - A worker runner that polls for, executes, and finalizes jobs
//! - Process supervision for detached workers

pub mod executor;
pub mod lease;
pub mod metrics;
pub mod queue;
pub mod retry;
pub mod runner;
pub mod shutdown;
pub mod supervisor;

pub use executor::{CommandExecutor, ExecutionResult, ExecutionStatus};
pub use lease::LeaseManager;
pub use metrics::MetricsRecorder;
pub use queue::JobQueue;
pub use retry::{RetryDecision, RetryPolicy};
pub use runner::{IterationOutcome, WorkerRunner};
pub use shutdown::install_shutdown_handler;
pub use supervisor::WorkerSupervisor;
