//! # Signal Bot Adapters - Binance Kline Feed
//!
//! ## Purpose
//!
//! Owns everything between the exchange and the strategy's event queue:
//! the streaming WebSocket session with bounded reconnect backoff, parsing of
//! Binance kline payloads into typed [`types::FeedEvent`]s, and the one-shot REST
//! history bootstrap.
//!
//! ## Integration Points
//!
//! - **Input Sources**: Binance combined kline stream, Binance REST `klines`
//! - **Output Destination**: a bounded `tokio::sync::mpsc` queue drained by the
//!   strategy scheduler once per tick, in arrival order
//! - **Error Handling**: every session failure becomes a
//!   [`types::ConnectionEvent`] and a backoff delay; the consumer never sees an error
//!
//! ## Adapters ARE:
//! - Format converters (JSON → typed candles and prices)
//! - Validators (non-finite or negative prices are dropped at ingestion)
//! - Connection managers (connect timeout, idle timeout, reconnect forever)
//!
//! ## Adapters are NOT:
//! - Indicator calculators or signal generators
//! - Owners of candle state (the strategy owns its candle series)

pub mod backoff;
pub mod error;
pub mod input;

pub use backoff::ReconnectBackoff;
pub use error::{AdapterError, Result};
pub use input::{
    bootstrap_history, BinanceRestHistory, ConnectionState, FeedSession, HistoryProvider,
    SessionConfig, SessionStats,
};
