//! Request and response payloads.

pub mod request;
pub mod response;

pub use request::{JobsQuery, MetricsQuery};
pub use response::{ApiResponse, HealthResponse, MetricsPayload};
