//! Events delivered by the feed session to the strategy queue

use serde::{Deserialize, Serialize};

use super::identifiers::Instrument;
use super::market::Candle;

/// Kline update. `is_final = false` refreshes the forming candle in place.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CandleUpdateEvent {
    pub instrument: Instrument,
    pub candle: Candle,
    pub is_final: bool,
}

/// Last traded price, delivered more often than candle closes
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LivePriceEvent {
    pub instrument: Instrument,
    pub price: f64,
}

/// Streaming connection lifecycle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ConnectionEvent {
    Open,
    Close { reason: Option<String> },
    Error { message: String },
}

/// Single queue item, consumed in arrival order once per scheduler tick
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum FeedEvent {
    Candle(CandleUpdateEvent),
    Price(LivePriceEvent),
    Connection(ConnectionEvent),
}
