//! Per-instrument adaptive thresholds
//!
//! A bounded hill-climbing controller driven by rolling win rates. A poor
//! short-window win rate tightens the extremes and widens the noise floor,
//! a strong one loosens them. Every value stays inside its configured bounds.

use serde::Serialize;
use signal_config::AdaptiveConfig;
use types::{TradeResult, TradingMode};

/// Decision thresholds read by the SIDE branch
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Thresholds {
    pub k_over: f64,
    pub k_under: f64,
    pub rsi_over: f64,
    pub rsi_under: f64,
}

/// Direction of the last threshold move
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Adjustment {
    Tighten,
    Loosen,
    Hold,
}

/// Outcome of one update, for logging and outbound events
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct AdaptiveUpdate {
    pub win_rate_short: f64,
    pub win_rate_long: f64,
    pub win_rate_mode: f64,
    pub adjustment: Adjustment,
    pub mode_toggled: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AdaptiveModel {
    pub k_over: f64,
    pub k_under: f64,
    pub rsi_over: f64,
    pub rsi_under: f64,
    pub min_atr_multiplier: f64,
    pub mode: TradingMode,
}

/// Win rate over the last `window` results; an empty window counts as 1.0
pub fn win_rate(results: &[TradeResult], window: usize) -> f64 {
    let recent = &results[results.len().saturating_sub(window)..];
    if recent.is_empty() {
        return 1.0;
    }
    let wins = recent.iter().filter(|r| r.is_win()).count();
    wins as f64 / recent.len() as f64
}

impl AdaptiveModel {
    pub fn from_config(config: &AdaptiveConfig) -> Self {
        Self {
            k_over: config.k_over,
            k_under: config.k_under,
            rsi_over: config.rsi_over,
            rsi_under: config.rsi_under,
            min_atr_multiplier: config.min_atr_multiplier,
            mode: TradingMode::default(),
        }
    }

    pub fn thresholds(&self) -> Thresholds {
        Thresholds {
            k_over: self.k_over,
            k_under: self.k_under,
            rsi_over: self.rsi_over,
            rsi_under: self.rsi_under,
        }
    }

    /// Recompute win rates over `results` (oldest first) and move thresholds.
    pub fn update(&mut self, results: &[TradeResult], config: &AdaptiveConfig) -> AdaptiveUpdate {
        let win_rate_short = win_rate(results, config.short_window);
        let win_rate_long = win_rate(results, config.long_window);
        let win_rate_mode = win_rate(results, config.mode_window);

        let adjustment = if win_rate_short < config.low_win_rate {
            self.shift(1.0, config);
            Adjustment::Tighten
        } else if win_rate_short > config.high_win_rate {
            self.shift(-1.0, config);
            Adjustment::Loosen
        } else {
            Adjustment::Hold
        };

        let mode_toggled = win_rate_mode < config.low_win_rate;
        if mode_toggled {
            self.mode = self.mode.toggled();
        }

        AdaptiveUpdate {
            win_rate_short,
            win_rate_long,
            win_rate_mode,
            adjustment,
            mode_toggled,
        }
    }

    /// `direction = 1` pushes every threshold toward the extremes
    fn shift(&mut self, direction: f64, config: &AdaptiveConfig) {
        let step = config.threshold_step * direction;
        self.min_atr_multiplier = config
            .min_atr_bounds
            .clamp(self.min_atr_multiplier + config.min_atr_step * direction);
        self.k_over = config.k_over_bounds.clamp(self.k_over + step);
        self.k_under = config.k_under_bounds.clamp(self.k_under - step);
        self.rsi_over = config.rsi_over_bounds.clamp(self.rsi_over + step);
        self.rsi_under = config.rsi_under_bounds.clamp(self.rsi_under - step);
    }

    pub fn within_bounds(&self, config: &AdaptiveConfig) -> bool {
        config.k_over_bounds.contains(self.k_over)
            && config.k_under_bounds.contains(self.k_under)
            && config.rsi_over_bounds.contains(self.rsi_over)
            && config.rsi_under_bounds.contains(self.rsi_under)
            && config.min_atr_bounds.contains(self.min_atr_multiplier)
    }
}
