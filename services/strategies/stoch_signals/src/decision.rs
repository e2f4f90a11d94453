//! Signal decision engine
//!
//! One parameterised pipeline with a per-regime branch table:
//! indicators on the working series, dead-market filter, regime branch,
//! confidence score, then the macro EMA filter.

use serde::Serialize;
use signal_config::{DecisionConfig, IndicatorConfig};
use types::{CandleSeries, RegimeLabel, Side, TradingMode, TrendLines};

use crate::adaptive::Thresholds;
use crate::indicators::{atr, ema, rsi, stoch_rsi, trend_lines, StochRsi};
use crate::scoring::{confidence, ScoreInputs};

/// Closed candles (at most `window`) with the live price appended as a
/// synthetic last point.
#[derive(Debug, Clone, PartialEq)]
pub struct WorkingSeries {
    pub closes: Vec<f64>,
    pub highs: Vec<f64>,
    pub lows: Vec<f64>,
    /// Number of closed candles in the full series, not just the window
    pub closed_count: usize,
    pub last_close: Option<f64>,
    pub live_price: f64,
}

impl WorkingSeries {
    pub fn new(series: &CandleSeries, live_price: f64, window: usize) -> Self {
        let mut closes = series.tail_closes(window);
        let mut highs = series.tail_highs(window);
        let mut lows = series.tail_lows(window);
        let last_close = closes.last().copied();
        closes.push(live_price);
        highs.push(live_price);
        lows.push(live_price);

        Self {
            closes,
            highs,
            lows,
            closed_count: series.len(),
            last_close,
            live_price,
        }
    }
}

/// Everything the engine needs besides the series itself
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DecisionContext {
    pub regime: RegimeLabel,
    pub thresholds: Thresholds,
    pub mode: TradingMode,
}

/// Accepted candidate with the indicator values that produced it
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Candidate {
    pub side: Side,
    pub score: f64,
    pub price: f64,
    pub rsi: f64,
    pub stoch: StochRsi,
    pub atr: Option<f64>,
    pub regime: RegimeLabel,
    pub lines: TrendLines,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SkipReason {
    InsufficientHistory,
    IndicatorsUnavailable,
    NoTrendLines,
    DeadMarket,
    NoSetup,
    AgainstMacroTrend,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Decision {
    Signal(Candidate),
    Skip(SkipReason),
}

/// Relative distance test; a zero line is never near
fn is_near(price: f64, line: f64, band: f64) -> bool {
    line != 0.0 && ((price - line) / line).abs() < band
}

#[derive(Debug, Clone)]
pub struct DecisionEngine {
    indicators: IndicatorConfig,
    config: DecisionConfig,
}

impl DecisionEngine {
    pub fn new(indicators: IndicatorConfig, config: DecisionConfig) -> Self {
        Self { indicators, config }
    }

    pub fn evaluate(&self, series: &WorkingSeries, ctx: &DecisionContext) -> Decision {
        let ind = &self.indicators;
        if series.closed_count < ind.rsi_period + ind.stoch_period {
            return Decision::Skip(SkipReason::InsufficientHistory);
        }

        let closes = &series.closes;
        let (Some(stoch), Some(rsi_now)) = (
            stoch_rsi(closes, ind.rsi_period, ind.stoch_period, ind.k_smooth, ind.d_smooth),
            rsi(closes, ind.rsi_period),
        ) else {
            return Decision::Skip(SkipReason::IndicatorsUnavailable);
        };
        let ema_fast = ema(closes, ind.ema_fast);
        let ema_slow = ema(closes, ind.ema_slow);

        let Some(lines) = trend_lines(&series.highs, &series.lows, self.config.min_trend_candles)
        else {
            return Decision::Skip(SkipReason::NoTrendLines);
        };

        let atr_now = atr(closes, ind.atr_period);
        if matches!(atr_now, Some(a) if a < self.config.dead_market_atr) {
            return Decision::Skip(SkipReason::DeadMarket);
        }

        let lp = series.live_price;
        let near_resistance = is_near(lp, lines.resistance, self.config.near_band);
        let near_support = is_near(lp, lines.support, self.config.near_band);

        let Some(side) = self.branch(series, ctx, &lines, stoch, rsi_now, near_resistance, near_support)
        else {
            return Decision::Skip(SkipReason::NoSetup);
        };

        let score = confidence(
            &ScoreInputs {
                stoch,
                rsi: rsi_now,
                ema_fast,
                ema_slow,
                near_line: near_resistance || near_support,
                atr: atr_now,
            },
            &self.config,
        );

        if let (Some(fast), Some(slow)) = (ema_fast, ema_slow) {
            let against = match side {
                Side::Call => fast < slow,
                Side::Put => fast > slow,
            };
            if against {
                return Decision::Skip(SkipReason::AgainstMacroTrend);
            }
        }

        Decision::Signal(Candidate {
            side,
            score,
            price: lp,
            rsi: rsi_now,
            stoch,
            atr: atr_now,
            regime: ctx.regime,
            lines,
        })
    }

    #[allow(clippy::too_many_arguments)]
    fn branch(
        &self,
        series: &WorkingSeries,
        ctx: &DecisionContext,
        lines: &TrendLines,
        stoch: StochRsi,
        rsi_now: f64,
        near_resistance: bool,
        near_support: bool,
    ) -> Option<Side> {
        let lp = series.live_price;
        let (k, d) = (stoch.k, stoch.d);

        match ctx.regime {
            RegimeLabel::Side => {
                let t = &ctx.thresholds;
                if near_resistance && k >= t.k_over && d >= t.k_over && rsi_now >= t.rsi_over {
                    Some(Side::Put)
                } else if near_support && k <= t.k_under && d <= t.k_under && rsi_now <= t.rsi_under
                {
                    Some(Side::Call)
                } else {
                    None
                }
            }
            RegimeLabel::Trend => {
                if lp > lines.resistance {
                    Some(Side::Call)
                } else if lp < lines.support {
                    Some(Side::Put)
                } else {
                    None
                }
            }
            RegimeLabel::Volatile => {
                let c = &self.config;
                if k >= c.volatile_k_over
                    && d >= c.volatile_k_over
                    && rsi_now >= c.volatile_rsi_over
                    && lp < lines.resistance
                {
                    Some(Side::Put)
                } else if k <= c.volatile_k_under
                    && d <= c.volatile_k_under
                    && rsi_now <= c.volatile_rsi_under
                    && lp > lines.support
                {
                    Some(Side::Call)
                } else if c.breakout_hint && ctx.mode == TradingMode::Breakout {
                    let last = series.last_close?;
                    if lp > lines.resistance && last > lines.resistance {
                        Some(Side::Call)
                    } else if lp < lines.support && last < lines.support {
                        Some(Side::Put)
                    } else {
                        None
                    }
                } else {
                    None
                }
            }
            RegimeLabel::Flat | RegimeLabel::Unknown => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use signal_config::AdaptiveConfig;
    use types::Candle;

    const MINUTE: i64 = 60_000;

    fn candle(minute: i64, close: f64, high: f64, low: f64) -> Candle {
        Candle {
            open_time: minute * MINUTE,
            close_time: minute * MINUTE + MINUTE - 1,
            open: close,
            high,
            low,
            close,
        }
    }

    fn series_from(closes: &[f64], highs: &[f64], lows: &[f64]) -> CandleSeries {
        CandleSeries::from_history(
            500,
            (0..closes.len()).map(|i| candle(i as i64, closes[i], highs[i], lows[i])),
        )
    }

    /// 100 flat candles then a steady fall with two support pivots
    fn falling_into_support() -> CandleSeries {
        let closes: Vec<f64> = (0..120)
            .map(|i| if i < 100 { 1.0 } else { 1.0 - (i - 99) as f64 * 0.0005 })
            .collect();
        let mut highs: Vec<f64> = closes.iter().map(|c| c + 0.0001).collect();
        let mut lows: Vec<f64> = closes.iter().map(|c| c - 0.0001).collect();
        highs[90] = 1.0004;
        highs[95] = 1.0004;
        lows[112] = closes[112] - 0.0007;
        lows[116] = closes[116] - 0.0007;
        series_from(&closes, &highs, &lows)
    }

    fn context(regime: RegimeLabel, mode: TradingMode) -> DecisionContext {
        let model = crate::adaptive::AdaptiveModel::from_config(&AdaptiveConfig::default());
        DecisionContext {
            regime,
            thresholds: model.thresholds(),
            mode,
        }
    }

    fn engine() -> DecisionEngine {
        DecisionEngine::new(IndicatorConfig::default(), DecisionConfig::default())
    }

    #[test]
    fn test_working_series_appends_live_price() {
        let series = falling_into_support();
        let working = WorkingSeries::new(&series, 0.9895, 50);
        assert_eq!(working.closes.len(), 51);
        assert_eq!(working.closed_count, 120);
        assert_eq!(working.closes.last(), Some(&0.9895));
        assert_eq!(working.highs.last(), Some(&0.9895));
        assert!((working.last_close.unwrap() - 0.99).abs() < 1e-12);
    }

    #[test]
    fn test_volatile_oversold_near_support_is_call() {
        let working = WorkingSeries::new(&falling_into_support(), 0.9895, 250);
        let decision = engine().evaluate(&working, &context(RegimeLabel::Volatile, TradingMode::Reversal));

        let Decision::Signal(candidate) = decision else {
            panic!("expected a signal, got {:?}", decision);
        };
        assert_eq!(candidate.side, Side::Call);
        assert_eq!(candidate.rsi, 0.0);
        assert_eq!(candidate.stoch, StochRsi { k: 0.0, d: 0.0 });
        assert!((candidate.lines.support - 0.9888).abs() < 1e-9);
        assert!((candidate.lines.resistance - 1.0004).abs() < 1e-9);
        assert!((candidate.score - 0.91).abs() < 1e-6);
    }

    #[test]
    fn test_flat_and_unknown_never_signal() {
        let working = WorkingSeries::new(&falling_into_support(), 0.9895, 250);
        for regime in [RegimeLabel::Flat, RegimeLabel::Unknown] {
            assert_eq!(
                engine().evaluate(&working, &context(regime, TradingMode::Reversal)),
                Decision::Skip(SkipReason::NoSetup)
            );
        }
    }

    #[test]
    fn test_trend_breakdown_is_put() {
        let working = WorkingSeries::new(&falling_into_support(), 0.9880, 250);
        let Decision::Signal(candidate) =
            engine().evaluate(&working, &context(RegimeLabel::Trend, TradingMode::Reversal))
        else {
            panic!("expected a signal");
        };
        assert_eq!(candidate.side, Side::Put);
    }

    #[test]
    fn test_side_needs_proximity() {
        let ctx = context(RegimeLabel::Side, TradingMode::Reversal);
        let working = WorkingSeries::new(&falling_into_support(), 0.9895, 250);
        assert!(matches!(engine().evaluate(&working, &ctx), Decision::Signal(c) if c.side == Side::Call));

        // Same oversold reading, but support is now outside the band
        let narrow = DecisionEngine::new(
            IndicatorConfig::default(),
            DecisionConfig {
                near_band: 0.0001,
                ..DecisionConfig::default()
            },
        );
        assert_eq!(narrow.evaluate(&working, &ctx), Decision::Skip(SkipReason::NoSetup));
    }

    #[test]
    fn test_dead_market_is_skipped() {
        let closes: Vec<f64> = (0..120)
            .map(|i| if i < 100 { 1.0 } else { 1.0 - (i - 99) as f64 * 0.00001 })
            .collect();
        let mut highs: Vec<f64> = closes.iter().map(|c| c + 0.0001).collect();
        let mut lows: Vec<f64> = closes.iter().map(|c| c - 0.0001).collect();
        highs[90] = 1.0004;
        highs[95] = 1.0004;
        lows[112] -= 0.0006;
        lows[116] -= 0.0006;
        let series = series_from(&closes, &highs, &lows);
        let working = WorkingSeries::new(&series, 0.99979, 250);

        assert_eq!(
            engine().evaluate(&working, &context(RegimeLabel::Volatile, TradingMode::Reversal)),
            Decision::Skip(SkipReason::DeadMarket)
        );
    }

    #[test]
    fn test_short_history_is_skipped() {
        let closes = vec![1.0; 20];
        let series = series_from(&closes, &closes, &closes);
        let working = WorkingSeries::new(&series, 1.0, 250);
        assert_eq!(
            engine().evaluate(&working, &context(RegimeLabel::Volatile, TradingMode::Reversal)),
            Decision::Skip(SkipReason::InsufficientHistory)
        );
    }

    #[test]
    fn test_macro_filter_rejects_call_in_downtrend() {
        // Long decline so EMA50 < EMA200, then the same support setup
        let mut closes: Vec<f64> = (0..200).map(|i| 1.2 - i as f64 * 0.001).collect();
        let base = closes[199];
        closes.extend((0..20).map(|i| base - (i + 1) as f64 * 0.0005));
        let mut highs: Vec<f64> = closes.iter().map(|c| c + 0.0001).collect();
        let mut lows: Vec<f64> = closes.iter().map(|c| c - 0.0001).collect();
        highs[190] += 0.01;
        highs[195] += 0.01;
        lows[212] -= 0.0006;
        lows[216] -= 0.0006;
        let series = series_from(&closes, &highs, &lows);
        let lp = closes[219] - 0.0005;
        let working = WorkingSeries::new(&series, lp, 250);

        let decision = engine().evaluate(&working, &context(RegimeLabel::Volatile, TradingMode::Reversal));
        assert_eq!(decision, Decision::Skip(SkipReason::AgainstMacroTrend));
    }

    #[test]
    fn test_breakout_hint_in_volatile() {
        let series = falling_into_support();
        // Oversold but already below support, so the double confirmation misses
        let working = WorkingSeries::new(&series, 0.9850, 250);
        let reversal = engine().evaluate(&working, &context(RegimeLabel::Volatile, TradingMode::Reversal));
        assert_eq!(reversal, Decision::Skip(SkipReason::NoSetup));

        let mut below = working.clone();
        below.last_close = Some(0.9860);
        let breakout = engine().evaluate(&below, &context(RegimeLabel::Volatile, TradingMode::Breakout));
        assert!(matches!(breakout, Decision::Signal(c) if c.side == Side::Put));
    }
}
