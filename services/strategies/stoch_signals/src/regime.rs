//! Market regime classification and trading-mode suggestion

use signal_config::{IndicatorConfig, RegimeConfig};
use types::{RegimeLabel, TradingMode, TrendLines};

use crate::indicators::{atr, ema, rsi_series};

/// RSI values averaged by the mode suggestion
const MODE_RSI_LOOKBACK: usize = 10;
/// Closes fed to the RSI used by the mode suggestion
const MODE_RSI_CLOSES: usize = 30;
/// Neutral RSI band in which a range-bound market suggests REVERSAL
const MODE_NEUTRAL_RSI: (f64, f64) = (35.0, 65.0);

/// Intermediate values behind a regime label, kept for snapshots and logs
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RegimeReading {
    pub label: RegimeLabel,
    pub atr: Option<f64>,
    pub ema_fast: Option<f64>,
    pub ema_slow: Option<f64>,
    pub rsi_range: Option<f64>,
}

impl RegimeReading {
    fn unknown() -> Self {
        Self {
            label: RegimeLabel::Unknown,
            atr: None,
            ema_fast: None,
            ema_slow: None,
            rsi_range: None,
        }
    }
}

/// Classify a series of closed-candle closes.
///
/// Priority order: not enough candles, FLAT, TREND, SIDE, then VOLATILE.
/// A missing slow EMA rules out TREND and SIDE.
pub fn classify(
    closes: &[f64],
    indicators: &IndicatorConfig,
    config: &RegimeConfig,
) -> RegimeReading {
    if closes.len() < config.min_candles {
        return RegimeReading::unknown();
    }

    let Some(atr_value) = atr(closes, indicators.atr_period) else {
        return RegimeReading::unknown();
    };
    let ema_fast = ema(closes, indicators.ema_fast);
    let ema_slow = ema(closes, indicators.ema_slow);

    let rsis = rsi_series(closes, indicators.rsi_period);
    let recent = &rsis[rsis.len().saturating_sub(config.rsi_range_lookback)..];
    let rsi_range = if recent.is_empty() {
        None
    } else {
        let min = recent.iter().copied().fold(f64::INFINITY, f64::min);
        let max = recent.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        Some(max - min)
    };

    let mut reading = RegimeReading {
        label: RegimeLabel::Volatile,
        atr: Some(atr_value),
        ema_fast,
        ema_slow,
        rsi_range,
    };

    if atr_value < config.flat_atr {
        reading.label = RegimeLabel::Flat;
        return reading;
    }

    if let (Some(fast), Some(slow), Some(range)) = (ema_fast, ema_slow, rsi_range) {
        if slow != 0.0 {
            let ema_diff = (fast - slow).abs() / slow.abs();
            if ema_diff > config.trend_ema_diff && range > config.trend_rsi_range {
                reading.label = RegimeLabel::Trend;
            } else if ema_diff < config.side_ema_diff && range < config.side_rsi_range {
                reading.label = RegimeLabel::Side;
            }
        }
    }

    reading
}

/// Mode hint from recent price action around the trend lines.
///
/// Two consecutive closes beyond the same line suggest BREAKOUT. A live
/// price between the lines with a neutral average RSI suggests REVERSAL.
pub fn suggest_mode(
    closes: &[f64],
    live_price: f64,
    lines: &TrendLines,
    rsi_period: usize,
) -> Option<TradingMode> {
    let tail = &closes[closes.len().saturating_sub(MODE_RSI_CLOSES)..];
    let rsis = rsi_series(tail, rsi_period);
    if rsis.len() < MODE_RSI_LOOKBACK {
        return None;
    }
    let recent = &rsis[rsis.len() - MODE_RSI_LOOKBACK..];
    let avg_rsi = recent.iter().sum::<f64>() / recent.len() as f64;

    if let [.., prev, last] = closes {
        let above = *prev > lines.resistance && *last > lines.resistance;
        let below = *prev < lines.support && *last < lines.support;
        if above || below {
            return Some(TradingMode::Breakout);
        }
    }

    let inside = live_price > lines.support && live_price < lines.resistance;
    if inside && avg_rsi > MODE_NEUTRAL_RSI.0 && avg_rsi < MODE_NEUTRAL_RSI.1 {
        return Some(TradingMode::Reversal);
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn configs() -> (IndicatorConfig, RegimeConfig) {
        (IndicatorConfig::default(), RegimeConfig::default())
    }

    #[test]
    fn test_short_history_is_unknown() {
        let (ind, reg) = configs();
        let closes = vec![1.0; 99];
        assert_eq!(classify(&closes, &ind, &reg).label, RegimeLabel::Unknown);
    }

    #[test]
    fn test_flat_market() {
        let (ind, reg) = configs();
        let closes: Vec<f64> = (0..150).map(|i| 1.0 + (i % 2) as f64 * 0.0001).collect();
        let reading = classify(&closes, &ind, &reg);
        assert_eq!(reading.label, RegimeLabel::Flat);
        assert!(reading.atr.unwrap() < reg.flat_atr);
    }

    #[test]
    fn test_missing_slow_ema_is_volatile() {
        let (ind, reg) = configs();
        let closes: Vec<f64> = (0..150).map(|i| 1.0 + (i % 2) as f64 * 0.001).collect();
        let reading = classify(&closes, &ind, &reg);
        assert_eq!(reading.ema_slow, None);
        assert_eq!(reading.label, RegimeLabel::Volatile);
    }

    #[test]
    fn test_trending_market() {
        let (ind, reg) = configs();
        // Steady climb with a pullback every third candle keeps RSI moving
        let mut closes = Vec::with_capacity(260);
        let mut price = 1.0;
        for i in 0..260 {
            price += if i % 3 == 2 { -0.004 } else { 0.006 };
            if i > 250 {
                price -= 0.02;
            }
            closes.push(price);
        }
        let reading = classify(&closes, &ind, &reg);
        assert!(reading.ema_fast.unwrap() > reading.ema_slow.unwrap());
        assert!(reading.rsi_range.unwrap() > reg.trend_rsi_range);
        assert_eq!(reading.label, RegimeLabel::Trend);
    }

    #[test]
    fn test_sideways_market() {
        let (ind, reg) = configs();
        let closes: Vec<f64> = (0..260).map(|i| 1.0 + (i % 2) as f64 * 0.001).collect();
        let reading = classify(&closes, &ind, &reg);
        assert!(reading.rsi_range.unwrap() < reg.side_rsi_range);
        assert_eq!(reading.label, RegimeLabel::Side);
    }

    #[test]
    fn test_mode_breakout_above_resistance() {
        let mut closes: Vec<f64> = (0..40).map(|i| 1.0 + (i % 2) as f64 * 0.01).collect();
        closes.push(1.2);
        closes.push(1.21);
        let lines = TrendLines {
            resistance: 1.1,
            support: 0.9,
        };
        assert_eq!(suggest_mode(&closes, 1.21, &lines, 14), Some(TradingMode::Breakout));
    }

    #[test]
    fn test_mode_reversal_inside_range() {
        let closes: Vec<f64> = (0..40).map(|i| 1.0 + (i % 2) as f64 * 0.01).collect();
        let lines = TrendLines {
            resistance: 1.1,
            support: 0.9,
        };
        assert_eq!(suggest_mode(&closes, 1.0, &lines, 14), Some(TradingMode::Reversal));
        assert_eq!(suggest_mode(&closes, 1.2, &lines, 14), None);
        assert_eq!(suggest_mode(&closes[..20], 1.0, &lines, 14), None);
    }
}
