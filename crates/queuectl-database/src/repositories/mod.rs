//! PostgreSQL repository implementations, one per table.

pub mod config;
pub mod job;
pub mod metric;

pub use config::ConfigRepository;
pub use job::JobRepository;
pub use metric::MetricRepository;
