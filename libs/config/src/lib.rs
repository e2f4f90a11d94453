//! # Signal Bot Configuration
//!
//! Centralized configuration and default constants for the signal bot.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use signal_config::BotConfig;
//! use std::path::Path;
//!
//! let config = BotConfig::load(Some(Path::new("config/stoch_signals.toml")))?;
//! assert!(config.trading.announce_end_second < 60);
//! # Ok::<(), anyhow::Error>(())
//! ```

pub mod bot_config;
pub mod defaults;

pub use bot_config::{
    AdaptiveConfig, BotConfig, Bounds, DecisionConfig, FeedConfig, IndicatorConfig,
    LoggingConfig, RegimeConfig, SchedulerConfig, ScoreWeights, TradingConfig, ENV_PREFIX,
};
