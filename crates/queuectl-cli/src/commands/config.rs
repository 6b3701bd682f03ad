//! Runtime configuration commands.
//!
//! These read and write the durable config table (for example
//! `backoff_base`), not the configuration file.

use clap::{Args, Subcommand};
use serde_json::json;

use queuectl_core::config::AppConfig;
use queuectl_core::result::AppResult;

use crate::output::{self, OutputFormat};

/// Arguments for config commands
#[derive(Debug, Args)]
pub struct ConfigArgs {
    /// Config subcommand
    #[command(subcommand)]
    pub command: ConfigCommand,
}

/// Config subcommands
#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Read a value
    Get {
        /// Config key
        key: String,
    },
    /// Insert or update a value
    Set {
        /// Config key
        key: String,
        /// New value
        value: String,
    },
}

/// Execute config commands
pub async fn execute(args: &ConfigArgs, config: &AppConfig, format: OutputFormat) -> AppResult<()> {
    let queue = super::connect_queue(config).await?;

    let (key, value) = match &args.command {
        ConfigCommand::Get { key } => (key, queue.get_config(key).await?),
        ConfigCommand::Set { key, value } => {
            queue.set_config(key, value).await?;
            (key, Some(value.clone()))
        }
    };

    match format {
        OutputFormat::Json => output::print_json(&json!({ "key": key, "value": value })),
        OutputFormat::Table => println!("{key} = {}", value.as_deref().unwrap_or("not set")),
    }
    Ok(())
}
