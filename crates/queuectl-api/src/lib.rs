//! # queuectl-api
//!
//! Read-only HTTP reporting surface for queuectl built on Axum: queue
//! statistics, recent jobs, and metric series.

pub mod app;
pub mod dto;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod router;
pub mod state;

pub use app::{build_app, run_dashboard};
pub use state::AppState;
