//! Candles and the bounded per-instrument candle store

use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use tracing::debug;

use super::errors::ValidationError;

/// OHLC summary of one fixed time bucket. Times are epoch milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Candle {
    pub open_time: i64,
    pub close_time: i64,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
}

impl Candle {
    /// True when every price field is finite and non-negative
    pub fn is_valid(&self) -> bool {
        [self.open, self.high, self.low, self.close]
            .iter()
            .all(|v| is_valid_price(*v))
    }
}

/// Finite and non-negative
pub fn is_valid_price(value: f64) -> bool {
    value.is_finite() && value >= 0.0
}

/// Closed candles for one instrument, oldest first, plus the candle still forming.
///
/// Closed candles have strictly increasing `open_time` and never exceed
/// `capacity`; the oldest is evicted first.
#[derive(Debug, Clone)]
pub struct CandleSeries {
    capacity: usize,
    closed: VecDeque<Candle>,
    forming: Option<Candle>,
}

impl CandleSeries {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            closed: VecDeque::with_capacity(capacity.max(1)),
            forming: None,
        }
    }

    /// Build from a bootstrap history, skipping invalid or out-of-order rows
    pub fn from_history(capacity: usize, candles: impl IntoIterator<Item = Candle>) -> Self {
        let mut series = Self::new(capacity);
        for candle in candles {
            if let Err(e) = series.push_closed(candle) {
                debug!(open_time = candle.open_time, "Dropped history row: {}", e);
            }
        }
        series
    }

    /// Append a closed candle, evicting the oldest when over capacity
    pub fn push_closed(&mut self, candle: Candle) -> Result<(), ValidationError> {
        Self::check(&candle)?;
        if let Some(last) = self.closed.back() {
            if candle.open_time <= last.open_time {
                return Err(ValidationError::OutOfOrder {
                    open_time: candle.open_time,
                    last_open_time: last.open_time,
                });
            }
        }

        self.closed.push_back(candle);
        while self.closed.len() > self.capacity {
            self.closed.pop_front();
        }
        if self
            .forming
            .is_some_and(|f| f.open_time <= candle.open_time)
        {
            self.forming = None;
        }
        Ok(())
    }

    /// Replace the in-progress candle's OHLC in place
    pub fn update_forming(&mut self, candle: Candle) -> Result<(), ValidationError> {
        Self::check(&candle)?;
        if let Some(last) = self.closed.back() {
            if candle.open_time <= last.open_time {
                return Err(ValidationError::OutOfOrder {
                    open_time: candle.open_time,
                    last_open_time: last.open_time,
                });
            }
        }
        self.forming = Some(candle);
        Ok(())
    }

    fn check(candle: &Candle) -> Result<(), ValidationError> {
        if candle.is_valid() {
            return Ok(());
        }
        let bad = [candle.open, candle.high, candle.low, candle.close]
            .into_iter()
            .find(|v| !is_valid_price(*v))
            .unwrap_or(f64::NAN);
        Err(ValidationError::InvalidPrice { value: bad })
    }

    pub fn len(&self) -> usize {
        self.closed.len()
    }

    pub fn is_empty(&self) -> bool {
        self.closed.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn last(&self) -> Option<&Candle> {
        self.closed.back()
    }

    pub fn forming(&self) -> Option<&Candle> {
        self.forming.as_ref()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Candle> {
        self.closed.iter()
    }

    /// Closing prices of the last `n` closed candles, oldest first
    pub fn tail_closes(&self, n: usize) -> Vec<f64> {
        self.tail(n).map(|c| c.close).collect()
    }

    pub fn tail_highs(&self, n: usize) -> Vec<f64> {
        self.tail(n).map(|c| c.high).collect()
    }

    pub fn tail_lows(&self, n: usize) -> Vec<f64> {
        self.tail(n).map(|c| c.low).collect()
    }

    pub fn closes(&self) -> Vec<f64> {
        self.tail_closes(self.closed.len())
    }

    fn tail(&self, n: usize) -> impl Iterator<Item = &Candle> {
        let skip = self.closed.len().saturating_sub(n);
        self.closed.iter().skip(skip)
    }
}
