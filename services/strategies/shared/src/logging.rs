//! Standardized logging for strategy services
//!
//! One subscriber initialisation per process plus a small emoji vocabulary so
//! signal, trade and learning lines are easy to pick out of a busy log.

use anyhow::{anyhow, Result};
use tracing_subscriber::EnvFilter;

/// Standard emoji set for strategy logging
pub struct LogEmoji;

impl LogEmoji {
    // Status indicators
    pub const SUCCESS: &'static str = "✅";
    pub const ERROR: &'static str = "❌";
    pub const WARNING: &'static str = "⚠️";

    // Module-specific
    pub const SIGNAL: &'static str = "📣"; // Signal emitted
    pub const TRADE: &'static str = "⚡"; // Trade opened
    pub const MONEY: &'static str = "💰"; // Trade closed, bankroll
    pub const LEARN: &'static str = "🧠"; // Adaptive update
    pub const CHART: &'static str = "📊"; // Data/statistics/metrics
    pub const NETWORK: &'static str = "🌐"; // Feed connection
    pub const CLOCK: &'static str = "⏱️"; // Scheduler, day rollover
}

/// Install the global subscriber.
///
/// `RUST_LOG` wins over `level` when set. Returns an error if a subscriber is
/// already installed.
pub fn init_strategy_logging(service: &str, level: &str, json: bool) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .map_err(|e| anyhow!("invalid log level '{}': {}", level, e))?;

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false);

    let installed = if json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
    installed.map_err(|e| anyhow!("failed to install subscriber for {}: {}", service, e))?;

    tracing::info!(service, "{} Logging initialised", LogEmoji::SUCCESS);
    Ok(())
}

// Convenience macros for standardized logging
#[macro_export]
macro_rules! log_signal {
    ($($arg:tt)*) => {
        tracing::info!("{} {}", $crate::logging::LogEmoji::SIGNAL, format!($($arg)*))
    };
}

#[macro_export]
macro_rules! log_trade {
    ($($arg:tt)*) => {
        tracing::info!("{} {}", $crate::logging::LogEmoji::TRADE, format!($($arg)*))
    };
}

#[macro_export]
macro_rules! log_profit {
    ($($arg:tt)*) => {
        tracing::info!("{} {}", $crate::logging::LogEmoji::MONEY, format!($($arg)*))
    };
}

#[macro_export]
macro_rules! log_learn {
    ($($arg:tt)*) => {
        tracing::info!("{} {}", $crate::logging::LogEmoji::LEARN, format!($($arg)*))
    };
}

#[macro_export]
macro_rules! log_network {
    ($($arg:tt)*) => {
        tracing::info!("{} {}", $crate::logging::LogEmoji::NETWORK, format!($($arg)*))
    };
}

#[macro_export]
macro_rules! log_metrics {
    ($($arg:tt)*) => {
        tracing::info!("{} {}", $crate::logging::LogEmoji::CHART, format!($($arg)*))
    };
}
