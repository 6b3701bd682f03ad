//! # queuectl-entity
//!
//! Domain entity models for queuectl. Every struct in this crate represents
//! a database table row or a domain value object. All entities derive
//! `Debug`, `Clone`, `Serialize`, `Deserialize`, and database entities
//! additionally derive `sqlx::FromRow`.

pub mod config;
pub mod job;
pub mod metric;

pub use config::ConfigEntry;
pub use job::{Job, JobState, NewJob, QueueStats};
pub use metric::{Metric, MetricBucket, MetricType};
