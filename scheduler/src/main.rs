// Scheduler binary entry point

use anyhow::Context;
use common::bootstrap::init_tracing;
use common::config::Settings;
use common::scheduler::CycleScheduler;
use common::trigger::TriggerSet;
use tracing::{error, info};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration
    let settings = Settings::load().context("Failed to load configuration")?;

    // Initialize tracing/logging
    init_tracing(&settings.observability);

    info!("Starting stock platform batch scheduler");

    settings
        .validate()
        .context("Invalid configuration")
        .map_err(|e| {
            error!(error = %e, "Configuration validation failed");
            e
        })?;

    info!(
        interval_hours = settings.scheduler.interval_hours,
        cooldown_seconds = settings.scheduler.cooldown_seconds,
        "Configuration loaded"
    );

    // Wire the deploy-script triggers
    let triggers = TriggerSet::from_settings(&settings.triggers);
    info!("Job triggers initialized");

    // Create and start the scheduler
    let scheduler = CycleScheduler::new(settings.scheduler.scheduler_config(), triggers);
    scheduler.start().await;

    // Block until SIGINT, then shut down gracefully
    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for Ctrl+C")?;
    info!("Received Ctrl+C signal, initiating graceful shutdown");

    scheduler.stop().await;
    info!("Scheduler stopped");

    Ok(())
}
