//! Reporting dashboard command.

use queuectl_core::config::AppConfig;
use queuectl_core::result::AppResult;

/// Serve the read-only dashboard until Ctrl+C
pub async fn execute(config: &AppConfig) -> AppResult<()> {
    let queue = super::connect_queue(config).await?;
    println!(
        "Dashboard running at http://{}:{}",
        config.dashboard.host, config.dashboard.port
    );

    queuectl_api::run_dashboard(queue, config.dashboard.clone(), async {
        let _ = tokio::signal::ctrl_c().await;
    })
    .await
}
