// New-Life - local-first productivity core
// Daemon entry point

use newlife::app;
use newlife::config::AppConfig;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = AppConfig::from_env();

    // Initialize logging
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(&config.log_filter))
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting New-Life v{}", env!("CARGO_PKG_VERSION"));

    let state = app::setup(&config).await?;

    let dashboard = state.dashboard().await;
    tracing::info!(
        "Tasks: {}/{} done ({}%), projects: {}, pending reminders: {}, habits done today: {}/{}",
        dashboard.tasks.completed,
        dashboard.tasks.total,
        dashboard.tasks.percentage,
        dashboard.projects,
        dashboard.pending_reminders,
        dashboard.habits_done_today,
        dashboard.habits
    );

    tokio::signal::ctrl_c().await?;

    state.shutdown().await;
    Ok(())
}
