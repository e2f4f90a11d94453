//! Error types for identifier parsing and candle-series validation

use thiserror::Error;

/// Errors raised while building or mutating domain values
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ValidationError {
    /// Symbol does not name one of the tracked instruments
    #[error("Unknown instrument symbol: '{symbol}'")]
    UnknownInstrument { symbol: String },

    /// Price field is NaN, infinite or negative
    #[error("Value is not a finite non-negative price: {value}")]
    InvalidPrice { value: f64 },

    /// Candle opened at or before the last retained closed candle
    #[error("Candle open time {open_time} is not after last open time {last_open_time}")]
    OutOfOrder { open_time: i64, last_open_time: i64 },

    /// Unrecognised enum label
    #[error("Unknown {kind} label: '{label}'")]
    UnknownLabel { kind: &'static str, label: String },
}
