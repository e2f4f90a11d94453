//! Testing utilities for strategies

use adapter_service::{AdapterError, HistoryProvider};
use async_trait::async_trait;
use std::collections::{BTreeMap, BTreeSet};
use types::{Candle, Instrument};

/// One-minute bucket length in milliseconds
pub const MINUTE_MS: i64 = 60_000;

/// Build consecutive one-minute candles from closing prices.
///
/// Each candle opens at the previous close and its high/low sit `spread`
/// above/below the larger/smaller of open and close.
pub fn candles_from_closes(closes: &[f64], spread: f64, start_minute: i64) -> Vec<Candle> {
    let mut prev = closes.first().copied().unwrap_or_default();
    closes
        .iter()
        .enumerate()
        .map(|(i, &close)| {
            let open_time = (start_minute + i as i64) * MINUTE_MS;
            let candle = Candle {
                open_time,
                close_time: open_time + MINUTE_MS - 1,
                open: prev,
                high: prev.max(close) + spread,
                low: prev.min(close) - spread,
                close,
            };
            prev = close;
            candle
        })
        .collect()
}

/// History provider serving canned candles, with optional per-instrument failures
#[derive(Debug, Default, Clone)]
pub struct MockHistoryProvider {
    pub histories: BTreeMap<Instrument, Vec<Candle>>,
    pub failing: BTreeSet<Instrument>,
}

impl MockHistoryProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_history(mut self, instrument: Instrument, candles: Vec<Candle>) -> Self {
        self.histories.insert(instrument, candles);
        self
    }

    pub fn with_failure(mut self, instrument: Instrument) -> Self {
        self.failing.insert(instrument);
        self
    }
}

#[async_trait]
impl HistoryProvider for MockHistoryProvider {
    async fn fetch_initial_history(
        &self,
        instrument: Instrument,
        count: usize,
    ) -> adapter_service::Result<Vec<Candle>> {
        if self.failing.contains(&instrument) {
            return Err(AdapterError::HistoryUnavailable {
                instrument,
                reason: "mock failure".to_string(),
            });
        }
        let candles = self.histories.get(&instrument).cloned().unwrap_or_default();
        let skip = candles.len().saturating_sub(count);
        Ok(candles.into_iter().skip(skip).collect())
    }
}
