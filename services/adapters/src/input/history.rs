//! Initial candle-history bootstrap
//!
//! [`HistoryProvider`] is the collaborator the strategy needs at start-up.
//! [`bootstrap_history`] asks for every instrument concurrently and keeps
//! whatever succeeded; one instrument failing never blocks the others.

use async_trait::async_trait;
use futures_util::future::join_all;
use std::collections::BTreeMap;
use tracing::{info, warn};
use types::{Candle, Instrument};

use super::collectors::binance::parse_kline_rows;
use crate::{AdapterError, Result};

/// One-shot source of closed candles, oldest first
#[async_trait]
pub trait HistoryProvider: Send + Sync {
    async fn fetch_initial_history(&self, instrument: Instrument, count: usize) -> Result<Vec<Candle>>;
}

/// Binance REST `klines` endpoint
pub struct BinanceRestHistory {
    client: reqwest::Client,
    base_url: String,
    interval: String,
}

impl BinanceRestHistory {
    pub fn new(feed: &signal_config::FeedConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(feed.request_timeout())
            .build()?;
        Ok(Self {
            client,
            base_url: feed.rest_url.clone(),
            interval: feed.interval.clone(),
        })
    }
}

#[async_trait]
impl HistoryProvider for BinanceRestHistory {
    async fn fetch_initial_history(&self, instrument: Instrument, count: usize) -> Result<Vec<Candle>> {
        let limit = count.to_string();
        let response = self
            .client
            .get(&self.base_url)
            .query(&[
                ("symbol", instrument.symbol()),
                ("interval", self.interval.as_str()),
                ("limit", limit.as_str()),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(AdapterError::HistoryUnavailable {
                instrument,
                reason: format!("HTTP {}", status),
            });
        }

        let body: serde_json::Value = response.json().await?;
        parse_kline_rows(&body, chrono::Utc::now().timestamp_millis())
    }
}

/// Fetch history for every instrument; failures are logged and left out
pub async fn bootstrap_history<P>(
    provider: &P,
    instruments: &[Instrument],
    count: usize,
) -> BTreeMap<Instrument, Vec<Candle>>
where
    P: HistoryProvider + ?Sized,
{
    let fetches = instruments.iter().map(|&instrument| async move {
        (instrument, provider.fetch_initial_history(instrument, count).await)
    });

    let mut loaded = BTreeMap::new();
    for (instrument, result) in join_all(fetches).await {
        match result {
            Ok(candles) => {
                info!("📊 {}: loaded {} historical candles", instrument, candles.len());
                loaded.insert(instrument, candles);
            }
            Err(e) => warn!("⚠️ {}: history bootstrap failed: {}", instrument, e),
        }
    }
    loaded
}
