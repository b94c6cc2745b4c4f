//! Library Notifier
//!
//! Standalone process that asks the library server for borrowers with books
//! due within a day and notifies each of them, once at start-up and then
//! every midnight.

use std::time::Duration;

use library_notifier::{
    shutdown_signal, LibraryClient, LogDispatcher, NoticeScheduler, NotifierConfig,
};
use tokio::sync::watch;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load configuration
    let config = NotifierConfig::load()?;

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                format!("library_notifier={}", config.log_level).into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!(
        version = env!("CARGO_PKG_VERSION"),
        server_url = %config.server_url,
        "Starting Library Notifier"
    );

    let client = LibraryClient::new(&config.server_url);

    // Wait for server to be available
    info!("Connecting to library server...");
    let mut retries = 0;
    loop {
        match client.health_check().await {
            Ok(()) => {
                info!("Connected to library server");
                break;
            }
            Err(e) => {
                retries += 1;
                if retries > config.connect_retries {
                    error!(
                        attempts = config.connect_retries,
                        "Failed to connect to library server"
                    );
                    return Err(e.into());
                }
                info!(
                    attempt = retries,
                    "Library server not available, retrying in 2 seconds..."
                );
                tokio::time::sleep(Duration::from_secs(2)).await;
            }
        }
    }

    // Create shutdown signal
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    // Start scheduler
    let scheduler = NoticeScheduler::new(client, LogDispatcher, shutdown_rx)
        .with_run_on_startup(config.run_on_startup);
    let scheduler_handle = tokio::spawn(scheduler.run());

    shutdown_signal().await;

    // Signal shutdown
    info!("Shutting down notifier...");
    let _ = shutdown_tx.send(true);

    // Wait for the scheduler to stop
    let _ = scheduler_handle.await;

    info!("Notifier shutdown complete");
    Ok(())
}
