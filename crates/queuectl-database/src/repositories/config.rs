//! Durable key/value config repository.

use sqlx::PgPool;

use queuectl_core::error::{AppError, ErrorKind};
use queuectl_core::result::AppResult;
use queuectl_entity::config::ConfigEntry;

/// Repository for the `queue_config` table.
#[derive(Debug, Clone)]
pub struct ConfigRepository {
    pool: PgPool,
}

impl ConfigRepository {
    /// Create a new config repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Read one entry.
    pub async fn get(&self, key: &str) -> AppResult<Option<ConfigEntry>> {
        sqlx::query_as::<_, ConfigEntry>("SELECT * FROM queue_config WHERE key = $1")
            .bind(key)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to read config", e))
    }

    /// Insert or overwrite an entry.
    pub async fn upsert(&self, key: &str, value: &str) -> AppResult<()> {
        sqlx::query(
            "INSERT INTO queue_config (key, value, updated_at) VALUES ($1, $2, NOW()) \
             ON CONFLICT (key) DO UPDATE SET value = EXCLUDED.value, updated_at = NOW()",
        )
        .bind(key)
        .bind(value)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to write config", e))?;
        Ok(())
    }
}
