//! Stochastic-RSI signal bot entry point
//!
//! Usage:
//!   stoch_signals
//!   stoch_signals --config config/stoch_signals.toml --log-level debug --json-logs

use adapter_service::{bootstrap_history, BinanceRestHistory, FeedSession, SessionConfig};
use anyhow::{Context, Result};
use clap::Parser;
use signal_config::BotConfig;
use std::path::PathBuf;
use stoch_signals::{EngineEvent, StochSignalStrategy};
use strategy_shared::{init_strategy_logging, Strategy};
use tokio::signal;
use tokio::sync::{mpsc, watch};
use tracing::{error, info, warn};

#[derive(Parser, Debug)]
#[command(name = "stoch_signals")]
#[command(about = "Stochastic-RSI signal bot with simulated minute trades")]
#[command(version)]
struct Args {
    /// Path to configuration file (defaults plus environment when omitted)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error); overrides the config file
    #[arg(short, long)]
    log_level: Option<String>,

    /// Enable JSON logging format
    #[arg(long)]
    json_logs: bool,
}

/// Outbound queue depth between the engine and the event logger
const EVENT_QUEUE_CAPACITY: usize = 1024;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config = BotConfig::load(args.config.as_deref())
        .context("Failed to load stoch_signals configuration")?;

    let level = args.log_level.as_deref().unwrap_or(&config.logging.level);
    init_strategy_logging("stoch_signals", level, args.json_logs || config.logging.json)?;

    info!(
        "Starting stoch_signals for {} instruments",
        config.instruments.len()
    );

    let history = BinanceRestHistory::new(&config.feed).context("Failed to build REST client")?;
    let histories =
        bootstrap_history(&history, &config.instruments, config.feed.history_candles).await;

    let (feed_tx, feed_rx) = mpsc::channel(config.feed.queue_capacity);
    let (events_tx, mut events_rx) = mpsc::channel::<EngineEvent>(EVENT_QUEUE_CAPACITY);
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let session = FeedSession::new(SessionConfig::from_feed(&config.feed, &config.instruments), feed_tx);
    let session_handle = tokio::spawn(session.run(shutdown_rx.clone()));

    let event_handle = tokio::spawn(async move {
        while let Some(event) = events_rx.recv().await {
            match serde_json::to_string(&event) {
                Ok(json) => info!(target: "stoch_signals::events", "{}", json),
                Err(e) => warn!("Failed to serialise engine event: {}", e),
            }
        }
    });

    let mut strategy = StochSignalStrategy::new(config, feed_rx, events_tx, shutdown_rx);
    strategy.load_history(histories);

    let strategy_handle = tokio::spawn(async move {
        if let Err(e) = strategy.start().await {
            error!("Strategy failed: {:?}", e);
        }
        if let Err(e) = strategy.stop().await {
            error!("Strategy stop failed: {:?}", e);
        }
    });

    info!("stoch_signals running. Press Ctrl+C to stop.");
    signal::ctrl_c()
        .await
        .context("Failed to listen for shutdown signal")?;

    info!("Shutting down stoch_signals");
    shutdown_tx.send(true).ok();

    if let Err(e) = strategy_handle.await {
        error!("Strategy task panicked: {}", e);
    }
    match session_handle.await {
        Ok(stats) => info!(
            connections = stats.connections,
            failures = stats.failures,
            dropped = stats.dropped_messages,
            "Feed session finished"
        ),
        Err(e) => error!("Feed session task panicked: {}", e),
    }
    event_handle.await.ok();

    Ok(())
}
