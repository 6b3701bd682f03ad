//! Database migration command.

use queuectl_core::config::AppConfig;
use queuectl_core::result::AppResult;
use queuectl_database::DatabasePool;
use queuectl_database::migration::run_migrations;

use crate::output;

/// Apply all pending migrations
pub async fn execute(config: &AppConfig) -> AppResult<()> {
    let db = DatabasePool::connect(&config.database).await?;
    println!("Running database migrations...");
    run_migrations(db.pool()).await?;
    db.close().await;
    output::print_success("All migrations applied successfully.");
    Ok(())
}
