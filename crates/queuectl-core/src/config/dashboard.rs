//! Reporting dashboard configuration.

use serde::{Deserialize, Serialize};

/// Read-only HTTP reporting surface configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DashboardConfig {
    /// Bind address.
    #[serde(default = "default_host")]
    pub host: String,
    /// Bind port.
    #[serde(default = "default_port")]
    pub port: u16,
    /// Maximum number of jobs returned by the job listing.
    #[serde(default = "default_max_jobs")]
    pub max_jobs: usize,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            max_jobs: default_max_jobs(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_max_jobs() -> usize {
    100
}
