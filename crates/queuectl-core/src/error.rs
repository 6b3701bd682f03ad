//! Unified application error types for queuectl.
//!
//! All crates map their internal errors into [`AppError`] for consistent
//! propagation through the ? operator.

use std::fmt;
use thiserror::Error;

/// Top-level error kind categorization used across the entire application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum ErrorKind {
    /// The job command was empty.
    InvalidCommand,
    /// A client-supplied job id already exists.
    DuplicateId,
    /// An unknown job state name was supplied as a filter.
    InvalidState,
    /// A job id prefix matched more than one job.
    AmbiguousId,
    /// A re-queue was requested for a job that is not dead.
    NotDead,
    /// The requested job was not found.
    NotFound,
    /// Any other input validation failure.
    Validation,
    /// A database error occurred.
    Database,
    /// A configuration error occurred.
    Configuration,
    /// A serialization/deserialization error occurred.
    Serialization,
    /// An I/O error occurred.
    Io,
    /// An internal error occurred.
    Internal,
    /// The store is temporarily unavailable.
    ServiceUnavailable,
}

impl ErrorKind {
    /// Whether this kind is a caller error that must never be retried.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::InvalidCommand
                | Self::DuplicateId
                | Self::InvalidState
                | Self::AmbiguousId
                | Self::NotDead
                | Self::NotFound
                | Self::Validation
        )
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidCommand => write!(f, "INVALID_COMMAND"),
            Self::DuplicateId => write!(f, "DUPLICATE_ID"),
            Self::InvalidState => write!(f, "INVALID_STATE"),
            Self::AmbiguousId => write!(f, "AMBIGUOUS_ID"),
            Self::NotDead => write!(f, "NOT_DEAD"),
            Self::NotFound => write!(f, "NOT_FOUND"),
            Self::Validation => write!(f, "VALIDATION"),
            Self::Database => write!(f, "DATABASE"),
            Self::Configuration => write!(f, "CONFIGURATION"),
            Self::Serialization => write!(f, "SERIALIZATION"),
            Self::Io => write!(f, "IO"),
            Self::Internal => write!(f, "INTERNAL"),
            Self::ServiceUnavailable => write!(f, "SERVICE_UNAVAILABLE"),
        }
    }
}

/// The unified application error used throughout queuectl.
///
/// All crate-specific errors are mapped into `AppError` using `From` impls
/// or explicit `.map_err()` calls.
#[derive(Debug, Error)]
#[error("{kind}: {message}")]
pub struct AppError {
    /// The category of error.
    pub kind: ErrorKind,
    /// A human-readable error message.
    pub message: String,
    /// Optional underlying cause.
    #[source]
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl AppError {
    /// Create a new application error.
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            source: None,
        }
    }

    /// Create a new application error with an underlying cause.
    pub fn with_source(
        kind: ErrorKind,
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self {
            kind,
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// The job command was empty.
    pub fn invalid_command() -> Self {
        Self::new(ErrorKind::InvalidCommand, "Command cannot be empty")
    }

    /// A job with the given id already exists.
    pub fn duplicate_id(id: &str) -> Self {
        Self::new(
            ErrorKind::DuplicateId,
            format!("Job with id \"{id}\" already exists"),
        )
    }

    /// An unknown state filter was supplied.
    pub fn invalid_state(state: &str, valid: &[&str]) -> Self {
        Self::new(
            ErrorKind::InvalidState,
            format!(
                "Invalid state: {state}. Valid states are: {}",
                valid.join(", ")
            ),
        )
    }

    /// An id prefix matched more than one job.
    pub fn ambiguous_id(prefix: &str) -> Self {
        Self::new(
            ErrorKind::AmbiguousId,
            format!(
                "Multiple jobs found matching \"{prefix}\". Please use a longer ID to be more specific."
            ),
        )
    }

    /// A lifecycle edge that the job's current state does not allow.
    pub fn invalid_transition(id: &str, from: impl fmt::Display, to: impl fmt::Display) -> Self {
        Self::new(
            ErrorKind::InvalidState,
            format!("Job {id} cannot move from {from} to {to}"),
        )
    }

    /// A re-queue was requested for a job outside the dead state.
    pub fn not_dead(id: &str, state: impl fmt::Display) -> Self {
        Self::new(
            ErrorKind::NotDead,
            format!(
                "Job {id} is not in DEAD state (current state: {state}). Only dead jobs can be retried from DLQ."
            ),
        )
    }

    /// Create a not-found error.
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::NotFound, message)
    }

    /// Create a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Validation, message)
    }

    /// Create a database error.
    pub fn database(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Database, message)
    }

    /// Create a configuration error.
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Configuration, message)
    }

    /// Create an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Internal, message)
    }

    /// Create a service-unavailable error.
    pub fn service_unavailable(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::ServiceUnavailable, message)
    }

    /// Whether the error is a caller error rather than a transient fault.
    pub fn is_validation(&self) -> bool {
        self.kind.is_validation()
    }
}

impl Clone for AppError {
    fn clone(&self) -> Self {
        Self {
            kind: self.kind,
            message: self.message.clone(),
            source: None,
        }
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        Self::with_source(
            ErrorKind::Serialization,
            format!("JSON serialization error: {err}"),
            err,
        )
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        Self::with_source(ErrorKind::Io, format!("I/O error: {err}"), err)
    }
}

impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        Self::with_source(
            ErrorKind::Configuration,
            format!("Configuration error: {err}"),
            err,
        )
    }
}
