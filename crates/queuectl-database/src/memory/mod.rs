//! In-process job store backed by concurrent maps.
//!
//! Shares nothing across processes; intended for tests and single-process
//! embedding.

mod store;

pub use store::MemoryJobStore;
