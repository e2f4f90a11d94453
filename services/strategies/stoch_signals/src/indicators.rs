//! Technical indicators for signal generation
//!
//! Pure functions over price series, oldest value first. Every function
//! returns `None` when the series is too short to be decidable.

use serde::Serialize;
use types::TrendLines;

/// Stochastic RSI pair, both in [0, 100]
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct StochRsi {
    pub k: f64,
    pub d: f64,
}

fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        None
    } else {
        Some(values.iter().sum::<f64>() / values.len() as f64)
    }
}

/// RSI of one window of `period` close-to-close deltas
fn rsi_window(deltas: &[f64]) -> f64 {
    let (gains, losses) = deltas.iter().fold((0.0, 0.0), |(g, l), &d| {
        if d > 0.0 {
            (g + d, l)
        } else {
            (g, l - d)
        }
    });
    let period = deltas.len() as f64;
    let avg_gain = gains / period;
    let avg_loss = losses / period;

    if avg_loss == 0.0 {
        return 100.0;
    }
    let rs = avg_gain / avg_loss;
    (100.0 - 100.0 / (1.0 + rs)).clamp(0.0, 100.0)
}

/// RSI value for every window of `period` deltas, oldest first.
///
/// Empty when `closes.len() < period + 1`.
pub fn rsi_series(closes: &[f64], period: usize) -> Vec<f64> {
    if period == 0 || closes.len() < period + 1 {
        return Vec::new();
    }
    let deltas: Vec<f64> = closes.windows(2).map(|w| w[1] - w[0]).collect();
    deltas.windows(period).map(rsi_window).collect()
}

/// Current RSI over the trailing `period` deltas
pub fn rsi(closes: &[f64], period: usize) -> Option<f64> {
    if period == 0 || closes.len() < period + 1 {
        return None;
    }
    let tail = &closes[closes.len() - period - 1..];
    let deltas: Vec<f64> = tail.windows(2).map(|w| w[1] - w[0]).collect();
    Some(rsi_window(&deltas))
}

fn stoch_of(window: &[f64]) -> f64 {
    let min = window.iter().copied().fold(f64::INFINITY, f64::min);
    let max = window.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let last = window.last().copied().unwrap_or(min);
    if max == min {
        0.0
    } else {
        100.0 * (last - min) / (max - min)
    }
}

/// Stochastic RSI with simple-mean K and D smoothing.
///
/// K averages the last `k_smooth` stochastic values and D averages the last
/// `d_smooth` of those. A flat RSI window yields K = D = 0.
pub fn stoch_rsi(
    closes: &[f64],
    rsi_period: usize,
    stoch_period: usize,
    k_smooth: usize,
    d_smooth: usize,
) -> Option<StochRsi> {
    let rsis = rsi_series(closes, rsi_period);
    if stoch_period == 0 || rsis.len() < stoch_period {
        return None;
    }

    let recent = &rsis[rsis.len() - stoch_period..];
    let min = recent.iter().copied().fold(f64::INFINITY, f64::min);
    let max = recent.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    if max == min {
        return Some(StochRsi { k: 0.0, d: 0.0 });
    }

    let stochs: Vec<f64> = rsis.windows(stoch_period).map(stoch_of).collect();
    let k_len = k_smooth.clamp(1, stochs.len());
    let k = mean(&stochs[stochs.len() - k_len..])?;

    let d_len = d_smooth.clamp(1, stochs.len());
    let d = mean(&stochs[stochs.len() - d_len..])?;

    Some(StochRsi {
        k: k.clamp(0.0, 100.0),
        d: d.clamp(0.0, 100.0),
    })
}

/// Mean absolute close-to-close move over the trailing `period` deltas
pub fn atr(closes: &[f64], period: usize) -> Option<f64> {
    if period == 0 || closes.len() < period + 1 {
        return None;
    }
    let tail = &closes[closes.len() - period - 1..];
    let total: f64 = tail.windows(2).map(|w| (w[1] - w[0]).abs()).sum();
    Some(total / period as f64)
}

/// Exponential moving average seeded with the first value
pub fn ema(values: &[f64], period: usize) -> Option<f64> {
    if period == 0 || values.len() < period {
        return None;
    }
    let k = 2.0 / (period as f64 + 1.0);
    let mut iter = values.iter();
    let seed = *iter.next()?;
    Some(iter.fold(seed, |acc, &v| v * k + acc * (1.0 - k)))
}

#[derive(Debug, Clone, Copy)]
struct Pivot {
    idx: usize,
    value: f64,
}

impl Pivot {
    fn project(a: Pivot, b: Pivot, at: usize) -> f64 {
        let slope = (b.value - a.value) / (b.idx as f64 - a.idx as f64);
        a.value + slope * (at as f64 - a.idx as f64)
    }
}

/// Resistance and support lines through the two most recent pivots per side.
///
/// Pivots are strict local extremes against both neighbours; the last point
/// is never a pivot. The lines are extrapolated to the last index.
pub fn trend_lines(highs: &[f64], lows: &[f64], min_candles: usize) -> Option<TrendLines> {
    let n = highs.len().min(lows.len());
    if n < min_candles.max(4) {
        return None;
    }

    let mut pivot_highs: Vec<Pivot> = Vec::with_capacity(3);
    let mut pivot_lows: Vec<Pivot> = Vec::with_capacity(3);

    for i in (2..=n - 2).rev() {
        let (h_prev, h_cur, h_next) = (highs[i - 1], highs[i], highs[i + 1]);
        let (l_prev, l_cur, l_next) = (lows[i - 1], lows[i], lows[i + 1]);

        if pivot_highs.len() < 3
            && [h_prev, h_cur, h_next].iter().all(|v| v.is_finite())
            && h_cur > h_prev
            && h_cur > h_next
        {
            pivot_highs.push(Pivot { idx: i, value: h_cur });
        }
        if pivot_lows.len() < 3
            && [l_prev, l_cur, l_next].iter().all(|v| v.is_finite())
            && l_cur < l_prev
            && l_cur < l_next
        {
            pivot_lows.push(Pivot { idx: i, value: l_cur });
        }
        if pivot_highs.len() >= 3 && pivot_lows.len() >= 3 {
            break;
        }
    }

    if pivot_highs.len() < 2 || pivot_lows.len() < 2 {
        return None;
    }

    let last_idx = n - 1;
    let resistance = Pivot::project(pivot_highs[0], pivot_highs[1], last_idx);
    let support = Pivot::project(pivot_lows[0], pivot_lows[1], last_idx);

    if !resistance.is_finite() || !support.is_finite() {
        return None;
    }
    Some(TrendLines {
        resistance,
        support,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(a: f64, b: f64) {
        assert!((a - b).abs() < 1e-9, "{} != {}", a, b);
    }

    #[test]
    fn test_rsi_requires_period_plus_one() {
        let closes: Vec<f64> = (0..14).map(|i| 1.0 + i as f64 * 0.01).collect();
        assert_eq!(rsi(&closes, 14), None);
        assert!(rsi_series(&closes, 14).is_empty());

        let mut longer = closes.clone();
        longer.push(1.5);
        assert_eq!(rsi(&longer, 14), Some(100.0));
        assert_eq!(rsi_series(&longer, 14).len(), 1);
    }

    #[test]
    fn test_rsi_balanced_moves() {
        // Alternating +1/-1 deltas give equal average gain and loss
        let closes: Vec<f64> = (0..15).map(|i| if i % 2 == 0 { 10.0 } else { 11.0 }).collect();
        assert_close(rsi(&closes, 14).unwrap(), 50.0);
    }

    #[test]
    fn test_rsi_falling_series_is_zero() {
        let closes: Vec<f64> = (0..20).map(|i| 2.0 - i as f64 * 0.01).collect();
        assert_eq!(rsi(&closes, 14), Some(0.0));
    }

    #[test]
    fn test_rsi_matches_last_series_value() {
        let closes: Vec<f64> = (0..40).map(|i| (i as f64 * 0.7).sin() + 5.0).collect();
        let series = rsi_series(&closes, 14);
        assert_eq!(series.len(), 40 - 14);
        assert_close(*series.last().unwrap(), rsi(&closes, 14).unwrap());
    }

    #[test]
    fn test_stoch_rsi_needs_enough_rsi_values() {
        let closes: Vec<f64> = (0..28).map(|i| (i as f64).cos()).collect();
        // 28 closes give 14 RSI values, exactly one stochastic window
        assert!(stoch_rsi(&closes, 14, 14, 3, 3).is_some());
        assert!(stoch_rsi(&closes[1..], 14, 14, 3, 3).is_none());
    }

    #[test]
    fn test_stoch_rsi_flat_window_is_zero() {
        let closes: Vec<f64> = (0..40).map(|i| 1.0 + i as f64 * 0.001).collect();
        let sd = stoch_rsi(&closes, 14, 14, 3, 3).unwrap();
        assert_eq!(sd, StochRsi { k: 0.0, d: 0.0 });
    }

    #[test]
    fn test_stoch_rsi_bounded() {
        let closes: Vec<f64> = (0..120).map(|i| (i as f64 * 0.3).sin() * 0.01 + 1.0).collect();
        let sd = stoch_rsi(&closes, 14, 14, 3, 3).unwrap();
        assert!((0.0..=100.0).contains(&sd.k));
        assert!((0.0..=100.0).contains(&sd.d));
    }

    #[test]
    fn test_atr_mean_absolute_delta() {
        let closes = [1.0, 1.1, 1.0, 1.2];
        assert_close(atr(&closes, 3).unwrap(), (0.1 + 0.1 + 0.2) / 3.0);
        assert_eq!(atr(&closes, 4), None);
    }

    #[test]
    fn test_ema_seed_and_length() {
        assert_eq!(ema(&[1.0, 2.0], 3), None);
        assert_eq!(ema(&[4.0, 4.0, 4.0], 3), Some(4.0));
        // k = 0.5 for period 3
        assert_close(ema(&[1.0, 3.0, 5.0], 3).unwrap(), 3.5);
    }

    #[test]
    fn test_trend_lines_through_recent_pivots() {
        let mut highs = vec![1.0; 25];
        let mut lows = vec![0.5; 25];
        highs[10] = 1.4;
        highs[18] = 1.2;
        lows[12] = 0.3;
        lows[20] = 0.4;

        let lines = trend_lines(&highs, &lows, 20).unwrap();
        // Resistance falls 0.025 per index from 1.2 at idx 18
        assert_close(lines.resistance, 1.2 - 0.025 * 6.0);
        // Support rises 0.0125 per index from 0.4 at idx 20
        assert_close(lines.support, 0.4 + 0.0125 * 4.0);
    }

    #[test]
    fn test_trend_lines_need_two_pivots_and_history() {
        let mut highs = vec![1.0; 25];
        let mut lows = vec![0.5; 25];
        highs[10] = 1.4;
        lows[12] = 0.3;
        lows[20] = 0.4;
        assert_eq!(trend_lines(&highs, &lows, 20), None);

        highs[18] = 1.2;
        assert!(trend_lines(&highs, &lows, 20).is_some());
        assert_eq!(trend_lines(&highs[..19], &lows[..19], 20), None);
    }

    #[test]
    fn test_last_point_is_never_a_pivot() {
        let mut highs = vec![1.0; 22];
        let mut lows = vec![0.5; 22];
        highs[5] = 1.3;
        highs[21] = 2.0;
        lows[6] = 0.2;
        lows[21] = 0.1;
        highs[9] = 1.1;
        lows[11] = 0.3;
        let lines = trend_lines(&highs, &lows, 20).unwrap();
        assert_close(lines.resistance, 1.1 + (1.1 - 1.3) / 4.0 * 12.0);
        assert_close(lines.support, 0.3 + (0.3 - 0.2) / 5.0 * 10.0);
    }
}
