//! # queuectl-database
//!
//! The [`JobStore`] contract plus its backends: PostgreSQL repositories for
//! multi-process deployments and an in-process store used by tests and
//! single-process embedding.

pub mod connection;
pub mod memory;
pub mod migration;
pub mod postgres;
pub mod repositories;
pub mod store;

pub use connection::DatabasePool;
pub use memory::MemoryJobStore;
pub use postgres::PostgresJobStore;
pub use store::JobStore;
