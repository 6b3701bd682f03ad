//! Application configuration schemas.
//!
//! All configuration structs are deserialized via the `config` crate from
//! optional TOML files and `QUEUECTL_`-prefixed environment variables. Each
//! sub-module represents a logical configuration section, and every field
//! carries a default so an empty environment yields a working setup.
//!
//! Runtime queue tunables such as `backoff_base` are not part of this file
//! based configuration; they live in the durable config table.

pub mod dashboard;
pub mod database;
pub mod logging;
pub mod worker;

use serde::{Deserialize, Serialize};

pub use self::dashboard::DashboardConfig;
pub use self::database::DatabaseConfig;
pub use self::logging::LoggingConfig;
pub use self::worker::WorkerConfig;

use crate::error::AppError;

/// Default base path of the configuration file (extension optional).
pub const DEFAULT_CONFIG_PATH: &str = "config/default";

/// Root application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Database connection settings.
    #[serde(default)]
    pub database: DatabaseConfig,
    /// Worker loop settings.
    #[serde(default)]
    pub worker: WorkerConfig,
    /// Reporting dashboard settings.
    #[serde(default)]
    pub dashboard: DashboardConfig,
    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Load configuration from the default file location.
    pub fn load(env: &str) -> Result<Self, AppError> {
        Self::load_with(DEFAULT_CONFIG_PATH, env)
    }

    /// Load configuration from `path`, overlaid by `config/{env}` and
    /// environment variables prefixed with `QUEUECTL_`.
    ///
    /// Nested keys use a double underscore, e.g. `QUEUECTL_DATABASE__URL`.
    pub fn load_with(path: &str, env: &str) -> Result<Self, AppError> {
        let config = config::Config::builder()
            .add_source(config::File::with_name(path).required(false))
            .add_source(config::File::with_name(&format!("config/{env}")).required(false))
            .add_source(
                config::Environment::with_prefix("QUEUECTL")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .map_err(|e| AppError::configuration(format!("Failed to build config: {e}")))?;

        config
            .try_deserialize()
            .map_err(|e| AppError::configuration(format!("Failed to deserialize config: {e}")))
    }
}
