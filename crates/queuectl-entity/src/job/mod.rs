//! Job domain entities.

pub mod model;
pub mod stats;
pub mod status;

pub use model::{Job, NewJob};
pub use stats::QueueStats;
pub use status::JobState;
