//! Bot Configuration Module
//!
//! Loads [`BotConfig`] from an optional TOML file, then applies environment
//! overrides (`STOCH_SIGNALS__<SECTION>__<KEY>`), then validates the result.
//! Every section falls back to its defaults, so an empty file is a valid config.

use anyhow::{bail, Context, Result};
use config_crate::{Config, Environment, File};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info};
use types::Instrument;

use crate::defaults;

/// Environment variable prefix for overrides
pub const ENV_PREFIX: &str = "STOCH_SIGNALS";

/// Top-level configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BotConfig {
    pub instruments: Vec<Instrument>,
    pub indicators: IndicatorConfig,
    pub regime: RegimeConfig,
    pub decision: DecisionConfig,
    pub trading: TradingConfig,
    pub adaptive: AdaptiveConfig,
    pub feed: FeedConfig,
    pub scheduler: SchedulerConfig,
    pub logging: LoggingConfig,
}

/// Indicator periods
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IndicatorConfig {
    pub rsi_period: usize,
    pub stoch_period: usize,
    pub k_smooth: usize,
    pub d_smooth: usize,
    pub atr_period: usize,
    pub ema_fast: usize,
    pub ema_slow: usize,
}

/// Fixed regime thresholds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegimeConfig {
    pub min_candles: usize,
    pub flat_atr: f64,
    pub trend_ema_diff: f64,
    pub trend_rsi_range: f64,
    pub side_ema_diff: f64,
    pub side_rsi_range: f64,
    pub rsi_range_lookback: usize,
}

/// Confidence score weights, in the order the scorer blends them
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoreWeights {
    pub kd_agreement: f64,
    pub rsi_extreme: f64,
    pub ema_alignment: f64,
    pub proximity: f64,
    pub volatility: f64,
}

impl ScoreWeights {
    pub fn total(&self) -> f64 {
        self.kd_agreement + self.rsi_extreme + self.ema_alignment + self.proximity + self.volatility
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DecisionConfig {
    pub dead_market_atr: f64,
    pub near_band: f64,
    pub volatile_k_over: f64,
    pub volatile_k_under: f64,
    pub volatile_rsi_over: f64,
    pub volatile_rsi_under: f64,
    pub min_trend_candles: usize,
    pub atr_score_floor: f64,
    pub atr_score_span: f64,
    /// Let BREAKOUT mode accept a confirmed breakout in VOLATILE markets
    pub breakout_hint: bool,
    pub weights: ScoreWeights,
}

/// Simulated fixed-stake trading on a one-minute cadence
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TradingConfig {
    pub stake: Decimal,
    pub payout: Decimal,
    /// First second of the minute in which signals are evaluated and promoted
    pub announce_start_second: u32,
    /// Last second (inclusive) of the evaluation window
    pub announce_end_second: u32,
    /// Second of the minute at which every open trade is closed
    pub exit_second: u32,
}

/// Inclusive numeric range
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub min: f64,
    pub max: f64,
}

impl Bounds {
    pub const fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    pub fn clamp(&self, value: f64) -> f64 {
        value.max(self.min).min(self.max)
    }

    pub fn contains(&self, value: f64) -> bool {
        value >= self.min && value <= self.max
    }
}

impl From<(f64, f64)> for Bounds {
    fn from((min, max): (f64, f64)) -> Self {
        Self::new(min, max)
    }
}

/// Hill-climbing controller settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AdaptiveConfig {
    pub k_over: f64,
    pub k_under: f64,
    pub rsi_over: f64,
    pub rsi_under: f64,
    pub min_atr_multiplier: f64,
    pub k_over_bounds: Bounds,
    pub k_under_bounds: Bounds,
    pub rsi_over_bounds: Bounds,
    pub rsi_under_bounds: Bounds,
    pub min_atr_bounds: Bounds,
    pub threshold_step: f64,
    pub min_atr_step: f64,
    pub low_win_rate: f64,
    pub high_win_rate: f64,
    pub short_window: usize,
    pub long_window: usize,
    pub mode_window: usize,
}

/// Streaming session and history bootstrap
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeedConfig {
    pub ws_url: String,
    pub rest_url: String,
    pub interval: String,
    pub history_candles: usize,
    pub max_candles: usize,
    pub work_window: usize,
    pub backoff_ms: Vec<u64>,
    pub connect_timeout_ms: u64,
    /// Silence on an open stream longer than this forces a reconnect
    pub idle_timeout_ms: u64,
    pub request_timeout_ms: u64,
    pub queue_capacity: usize,
}

impl FeedConfig {
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    pub fn idle_timeout(&self) -> Duration {
        Duration::from_millis(self.idle_timeout_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    pub fast_tick_ms: u64,
    pub slow_tick_ms: u64,
    pub metrics_interval_secs: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub json: bool,
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            instruments: Instrument::ALL.to_vec(),
            indicators: IndicatorConfig::default(),
            regime: RegimeConfig::default(),
            decision: DecisionConfig::default(),
            trading: TradingConfig::default(),
            adaptive: AdaptiveConfig::default(),
            feed: FeedConfig::default(),
            scheduler: SchedulerConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for IndicatorConfig {
    fn default() -> Self {
        use defaults::indicators::*;
        Self {
            rsi_period: RSI_PERIOD,
            stoch_period: STOCH_PERIOD,
            k_smooth: K_SMOOTH,
            d_smooth: D_SMOOTH,
            atr_period: ATR_PERIOD,
            ema_fast: EMA_FAST,
            ema_slow: EMA_SLOW,
        }
    }
}

impl Default for RegimeConfig {
    fn default() -> Self {
        use defaults::regime::*;
        Self {
            min_candles: MIN_CANDLES,
            flat_atr: FLAT_ATR,
            trend_ema_diff: TREND_EMA_DIFF,
            trend_rsi_range: TREND_RSI_RANGE,
            side_ema_diff: SIDE_EMA_DIFF,
            side_rsi_range: SIDE_RSI_RANGE,
            rsi_range_lookback: RSI_RANGE_LOOKBACK,
        }
    }
}

impl Default for ScoreWeights {
    fn default() -> Self {
        use defaults::decision::*;
        Self {
            kd_agreement: WEIGHT_KD_AGREEMENT,
            rsi_extreme: WEIGHT_RSI_EXTREME,
            ema_alignment: WEIGHT_EMA_ALIGNMENT,
            proximity: WEIGHT_PROXIMITY,
            volatility: WEIGHT_VOLATILITY,
        }
    }
}

impl Default for DecisionConfig {
    fn default() -> Self {
        use defaults::decision::*;
        Self {
            dead_market_atr: DEAD_MARKET_ATR,
            near_band: NEAR_BAND,
            volatile_k_over: VOLATILE_K_OVER,
            volatile_k_under: VOLATILE_K_UNDER,
            volatile_rsi_over: VOLATILE_RSI_OVER,
            volatile_rsi_under: VOLATILE_RSI_UNDER,
            min_trend_candles: MIN_TREND_CANDLES,
            atr_score_floor: ATR_SCORE_FLOOR,
            atr_score_span: ATR_SCORE_SPAN,
            breakout_hint: true,
            weights: ScoreWeights::default(),
        }
    }
}

impl Default for TradingConfig {
    fn default() -> Self {
        use defaults::trading::*;
        Self {
            stake: dec!(1.00),
            payout: dec!(0.89),
            announce_start_second: ANNOUNCE_START_SECOND,
            announce_end_second: ANNOUNCE_END_SECOND,
            exit_second: EXIT_SECOND,
        }
    }
}

impl Default for AdaptiveConfig {
    fn default() -> Self {
        use defaults::adaptive::*;
        Self {
            k_over: K_OVER,
            k_under: K_UNDER,
            rsi_over: RSI_OVER,
            rsi_under: RSI_UNDER,
            min_atr_multiplier: MIN_ATR_MULTIPLIER,
            k_over_bounds: K_OVER_BOUNDS.into(),
            k_under_bounds: K_UNDER_BOUNDS.into(),
            rsi_over_bounds: RSI_OVER_BOUNDS.into(),
            rsi_under_bounds: RSI_UNDER_BOUNDS.into(),
            min_atr_bounds: MIN_ATR_BOUNDS.into(),
            threshold_step: THRESHOLD_STEP,
            min_atr_step: MIN_ATR_STEP,
            low_win_rate: LOW_WIN_RATE,
            high_win_rate: HIGH_WIN_RATE,
            short_window: SHORT_WINDOW,
            long_window: LONG_WINDOW,
            mode_window: MODE_WINDOW,
        }
    }
}

impl Default for FeedConfig {
    fn default() -> Self {
        use defaults::feed::*;
        Self {
            ws_url: WS_URL.to_string(),
            rest_url: REST_URL.to_string(),
            interval: INTERVAL.to_string(),
            history_candles: HISTORY_CANDLES,
            max_candles: MAX_CANDLES,
            work_window: WORK_WINDOW,
            backoff_ms: BACKOFF_MS.to_vec(),
            connect_timeout_ms: CONNECT_TIMEOUT_MS,
            idle_timeout_ms: IDLE_TIMEOUT_MS,
            request_timeout_ms: REQUEST_TIMEOUT_MS,
            queue_capacity: QUEUE_CAPACITY,
        }
    }
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        use defaults::scheduler::*;
        Self {
            fast_tick_ms: FAST_TICK_MS,
            slow_tick_ms: SLOW_TICK_MS,
            metrics_interval_secs: METRICS_INTERVAL_SECS,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

impl BotConfig {
    /// Load configuration from an optional file with environment overrides
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut builder = Config::builder();

        if let Some(path) = path {
            info!("Loading configuration from {:?}", path);
            builder = builder.add_source(File::from(path).required(true));
        } else {
            debug!("No configuration file given, using defaults");
        }

        builder = builder.add_source(
            Environment::with_prefix(ENV_PREFIX)
                .separator("__")
                .try_parsing(true),
        );

        let config: BotConfig = builder
            .build()
            .context("Failed to build configuration")?
            .try_deserialize()
            .context("Failed to deserialize configuration")?;

        config.validate().context("Invalid configuration")?;
        Ok(config)
    }

    /// Parse a TOML document directly, without environment overrides
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: BotConfig = toml::from_str(content).context("Failed to parse TOML")?;
        config.validate().context("Invalid configuration")?;
        Ok(config)
    }

    /// Reject settings the scheduler or indicators cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.instruments.is_empty() {
            bail!("at least one instrument is required");
        }

        let ind = &self.indicators;
        if [ind.rsi_period, ind.stoch_period, ind.k_smooth, ind.d_smooth, ind.atr_period]
            .contains(&0)
        {
            bail!("indicator periods must be positive");
        }
        if ind.ema_fast == 0 || ind.ema_fast >= ind.ema_slow {
            bail!(
                "ema_fast ({}) must be positive and below ema_slow ({})",
                ind.ema_fast,
                ind.ema_slow
            );
        }

        let t = &self.trading;
        if t.announce_start_second > t.announce_end_second || t.announce_end_second > 59 {
            bail!(
                "announce window {}..={} must lie within 0..=59",
                t.announce_start_second,
                t.announce_end_second
            );
        }
        if t.exit_second > 59 {
            bail!("exit_second {} must lie within 0..=59", t.exit_second);
        }
        if (t.announce_start_second..=t.announce_end_second).contains(&t.exit_second) {
            bail!("exit_second {} falls inside the announce window", t.exit_second);
        }
        if t.stake <= Decimal::ZERO {
            bail!("stake must be positive");
        }
        if t.payout <= Decimal::ZERO || t.payout > dec!(10) {
            bail!("payout {} must lie in (0, 10]", t.payout);
        }

        let a = &self.adaptive;
        for (name, bounds, value) in [
            ("k_over", a.k_over_bounds, a.k_over),
            ("k_under", a.k_under_bounds, a.k_under),
            ("rsi_over", a.rsi_over_bounds, a.rsi_over),
            ("rsi_under", a.rsi_under_bounds, a.rsi_under),
            ("min_atr_multiplier", a.min_atr_bounds, a.min_atr_multiplier),
        ] {
            if bounds.min > bounds.max {
                bail!("{} bounds are inverted: {} > {}", name, bounds.min, bounds.max);
            }
            if !bounds.contains(value) {
                bail!("{} initial value {} outside [{}, {}]", name, value, bounds.min, bounds.max);
            }
        }
        if a.short_window == 0 || a.mode_window == 0 || a.long_window == 0 {
            bail!("adaptive windows must be positive");
        }

        let f = &self.feed;
        if f.backoff_ms.is_empty() {
            bail!("feed.backoff_ms must list at least one delay");
        }
        if f.max_candles == 0 || f.work_window == 0 || f.queue_capacity == 0 {
            bail!("feed capacities must be positive");
        }

        if self.scheduler.fast_tick_ms == 0 || self.scheduler.slow_tick_ms == 0 {
            bail!("scheduler tick periods must be positive");
        }
        if self.scheduler.metrics_interval_secs == 0 {
            bail!("scheduler.metrics_interval_secs must be positive");
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_defaults_are_valid() {
        let config = BotConfig::default();
        config.validate().unwrap();
        assert_eq!(config.instruments.len(), 4);
        assert_eq!(config.trading.stake, dec!(1.00));
        assert_eq!(config.trading.payout, dec!(0.89));
        assert!((config.decision.weights.total() - 1.0).abs() < 1e-9);
        assert_eq!(config.feed.backoff_ms, vec![1000, 2000, 5000, 8000, 12000]);
    }

    #[test]
    fn test_load_partial_file() {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("stoch_signals.toml");

        let config_content = r#"
instruments = ["BTCUSDT", "ETHUSDT"]

[trading]
stake = 2.5
announce_end_second = 20

[adaptive]
min_atr_multiplier = 0.3

[logging]
level = "debug"
"#;

        fs::write(&config_path, config_content).unwrap();

        let config = BotConfig::load(Some(&config_path)).unwrap();

        assert_eq!(config.instruments, vec![Instrument::BtcUsdt, Instrument::EthUsdt]);
        assert_eq!(config.trading.stake, dec!(2.5));
        assert_eq!(config.trading.announce_end_second, 20);
        assert_eq!(config.trading.exit_second, 0);
        assert!((config.adaptive.min_atr_multiplier - 0.3).abs() < 1e-12);
        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.indicators.rsi_period, 14);
    }

    #[test]
    fn test_shipped_config_matches_defaults() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("../../config/stoch_signals.toml");
        let config = BotConfig::load(Some(&path)).unwrap();
        let defaults = BotConfig::default();
        assert_eq!(config.instruments, defaults.instruments);
        assert_eq!(config.indicators, defaults.indicators);
        assert_eq!(config.regime, defaults.regime);
        assert_eq!(config.decision, defaults.decision);
        assert_eq!(config.trading, defaults.trading);
        assert_eq!(config.adaptive, defaults.adaptive);
        assert_eq!(config.feed.backoff_ms, defaults.feed.backoff_ms);
        assert_eq!(config.scheduler, defaults.scheduler);
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let dir = tempdir().unwrap();
        let missing = dir.path().join("nope.toml");
        assert!(BotConfig::load(Some(&missing)).is_err());
    }

    #[test]
    fn test_environment_override() {
        std::env::set_var("STOCH_SIGNALS__FEED__QUEUE_CAPACITY", "128");
        let config = BotConfig::load(None).unwrap();
        std::env::remove_var("STOCH_SIGNALS__FEED__QUEUE_CAPACITY");
        assert_eq!(config.feed.queue_capacity, 128);
    }

    #[test]
    fn test_exit_second_inside_window_rejected() {
        let err = BotConfig::from_toml_str("[trading]\nexit_second = 10\n").unwrap_err();
        assert!(format!("{:#}", err).contains("announce window"));
    }

    #[test]
    fn test_zero_metrics_interval_rejected() {
        let err = BotConfig::from_toml_str("[scheduler]\nmetrics_interval_secs = 0\n").unwrap_err();
        assert!(format!("{:#}", err).contains("metrics_interval_secs"));

        let mut config = BotConfig::default();
        config.scheduler.fast_tick_ms = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_initial_threshold_outside_bounds_rejected() {
        let mut config = BotConfig::default();
        config.adaptive.k_over = 80.0;
        assert!(config.validate().is_err());

        let mut config = BotConfig::default();
        config.feed.backoff_ms.clear();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_bounds_clamp() {
        let b = Bounds::new(90.0, 99.0);
        assert_eq!(b.clamp(100.0), 99.0);
        assert_eq!(b.clamp(42.0), 90.0);
        assert_eq!(b.clamp(95.5), 95.5);
    }
}
