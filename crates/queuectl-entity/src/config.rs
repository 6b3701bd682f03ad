//! Durable key/value configuration entries.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Config key holding the exponential backoff base.
pub const BACKOFF_BASE_KEY: &str = "backoff_base";

/// A single durable configuration entry.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ConfigEntry {
    /// Configuration key.
    pub key: String,
    /// Raw string value.
    pub value: String,
    /// When the entry was last written.
    pub updated_at: DateTime<Utc>,
}
