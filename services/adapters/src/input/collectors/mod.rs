//! Venue-specific message parsing

pub mod binance;

pub use binance::{combined_stream_url, parse_kline_rows, parse_stream_message};
