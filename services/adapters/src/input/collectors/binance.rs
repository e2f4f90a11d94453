//! Binance kline stream and REST kline parsing
//!
//! ## Data Format Reference
//!
//! Combined stream (`/stream?streams=adausdt@kline_1m/...`):
//! ```json
//! {"stream":"adausdt@kline_1m","data":{"e":"kline","E":1700000000123,"s":"ADAUSDT",
//!   "k":{"t":1699999980000,"T":1700000039999,"s":"ADAUSDT","i":"1m",
//!        "o":"0.3710","c":"0.3712","h":"0.3715","l":"0.3708","x":false}}}
//! ```
//!
//! REST `GET /api/v3/klines` rows:
//! `[openTime, "open", "high", "low", "close", "volume", closeTime, ...]`

use serde::Deserialize;
use serde_json::Value;
use tracing::debug;
use types::{Candle, CandleUpdateEvent, FeedEvent, Instrument, LivePriceEvent};
use url::Url;

use crate::input::components::parsing_utils::{parse_millis, parse_price, parse_price_str};
use crate::{AdapterError, Result};

#[derive(Debug, Clone, Deserialize)]
struct BinanceKlineEvent {
    #[serde(rename = "s")]
    symbol: String,
    #[serde(rename = "k")]
    kline: BinanceKline,
}

#[derive(Debug, Clone, Deserialize)]
struct BinanceKline {
    #[serde(rename = "t")]
    open_time: i64,
    #[serde(rename = "T")]
    close_time: i64,
    #[serde(rename = "o")]
    open: String,
    #[serde(rename = "h")]
    high: String,
    #[serde(rename = "l")]
    low: String,
    #[serde(rename = "c")]
    close: String,
    #[serde(rename = "x")]
    is_final: bool,
}

/// Build the combined-stream URL for the tracked instruments
pub fn combined_stream_url(base: &str, instruments: &[Instrument], interval: &str) -> Result<Url> {
    if instruments.is_empty() {
        return Err(AdapterError::Configuration(
            "no instruments to subscribe".to_string(),
        ));
    }

    let streams = instruments
        .iter()
        .map(|i| format!("{}@kline_{}", i.stream_name(), interval))
        .collect::<Vec<_>>()
        .join("/");

    Ok(Url::parse(&format!("{}?streams={}", base.trim_end_matches('/'), streams))?)
}

/// Parse one WebSocket text frame into feed events.
///
/// A kline yields a live price (its close) followed by the candle update.
/// Frames that are not klines (subscription acks and the like) yield nothing.
pub fn parse_stream_message(text: &str) -> Result<Vec<FeedEvent>> {
    let value: Value = serde_json::from_str(text)?;
    let data = value.get("data").unwrap_or(&value);

    match data.get("e").and_then(Value::as_str) {
        Some("kline") => {}
        Some(other) => {
            debug!("Ignoring Binance event type: {}", other);
            return Ok(Vec::new());
        }
        None => return Ok(Vec::new()),
    }

    let event: BinanceKlineEvent = serde_json::from_value(data.clone())?;

    let instrument: Instrument = event
        .symbol
        .parse()
        .map_err(|_| AdapterError::InvalidInstrument(event.symbol.clone()))?;

    let k = &event.kline;
    let candle = Candle {
        open_time: k.open_time,
        close_time: k.close_time,
        open: parse_price_str(&k.open)?,
        high: parse_price_str(&k.high)?,
        low: parse_price_str(&k.low)?,
        close: parse_price_str(&k.close)?,
    };

    Ok(vec![
        FeedEvent::Price(LivePriceEvent {
            instrument,
            price: candle.close,
        }),
        FeedEvent::Candle(CandleUpdateEvent {
            instrument,
            candle,
            is_final: k.is_final,
        }),
    ])
}

/// Parse a REST klines response, dropping malformed rows and any candle
/// whose close time is not before `now_ms` (the bucket still forming).
pub fn parse_kline_rows(body: &Value, now_ms: i64) -> Result<Vec<Candle>> {
    let rows = body
        .as_array()
        .ok_or_else(|| AdapterError::InvalidMessage("klines response is not an array".to_string()))?;

    let mut candles = Vec::with_capacity(rows.len());
    for row in rows {
        match parse_kline_row(row) {
            Ok(candle) if candle.close_time < now_ms => candles.push(candle),
            Ok(_) => {}
            Err(e) => debug!("Dropping malformed kline row: {}", e),
        }
    }
    Ok(candles)
}

fn parse_kline_row(row: &Value) -> Result<Candle> {
    let fields = row
        .as_array()
        .ok_or_else(|| AdapterError::InvalidMessage("kline row is not an array".to_string()))?;

    Ok(Candle {
        open_time: parse_millis(fields.first(), "openTime")?,
        open: parse_price(fields.get(1), "open")?,
        high: parse_price(fields.get(2), "high")?,
        low: parse_price(fields.get(3), "low")?,
        close: parse_price(fields.get(4), "close")?,
        close_time: parse_millis(fields.get(6), "closeTime")?,
    })
}
