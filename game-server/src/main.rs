use anyhow::Context;
use std::sync::Arc;
use tokio::signal;
use tracing::{info, warn};

use game_server::{Config, RoomRegistry};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    info!("Starting Sketch Arena room host...");

    let config = Config::from_env().context("Failed to read configuration")?;
    let word_bank = config
        .load_word_bank()
        .context("The room host needs a word list to run")?;
    info!("Loaded {} words", word_bank.len());

    if config.tick_interval().is_none() {
        warn!("TICK_INTERVAL_MS is 0; round clocks only move on external ticks");
    }

    let registry = Arc::new(RoomRegistry::new(&config, Arc::new(word_bank)));

    // Start cleanup task
    let cleanup_registry = registry.clone();
    let idle_timeout = config.room_idle_timeout();
    let cleanup_interval = config.cleanup_interval();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(cleanup_interval);
        loop {
            interval.tick().await;
            let removed = cleanup_registry.cleanup_idle_rooms(idle_timeout).await;
            if removed > 0 {
                info!(
                    "Cleaned up {} idle rooms, {} still open",
                    removed,
                    cleanup_registry.room_count()
                );
            }
        }
    });

    info!("Room host ready. Press Ctrl+C to stop.");
    wait_for_shutdown().await?;

    registry.shutdown().await;
    info!("Room host shutdown complete.");
    Ok(())
}

// Wait for SIGINT (Ctrl+C) or SIGTERM
async fn wait_for_shutdown() -> anyhow::Result<()> {
    #[cfg(unix)]
    {
        let mut sigint = signal::unix::signal(signal::unix::SignalKind::interrupt())
            .context("Failed to listen for SIGINT")?;
        let mut sigterm = signal::unix::signal(signal::unix::SignalKind::terminate())
            .context("Failed to listen for SIGTERM")?;
        tokio::select! {
            _ = sigint.recv() => {
                info!("Received SIGINT, shutting down gracefully...");
            }
            _ = sigterm.recv() => {
                info!("Received SIGTERM, shutting down gracefully...");
            }
        }
    }
    #[cfg(not(unix))]
    {
        signal::ctrl_c()
            .await
            .context("Failed to listen for ctrl+c")?;
        info!("Received Ctrl+C, shutting down gracefully...");
    }
    Ok(())
}
