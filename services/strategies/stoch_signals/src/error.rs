//! Error types for the stochastic-RSI signal strategy

use thiserror::Error;
use types::{Instrument, ValidationError};

#[derive(Debug, Error)]
pub enum StrategyError {
    #[error("Market data error for {instrument}: {source}")]
    MarketData {
        instrument: Instrument,
        #[source]
        source: ValidationError,
    },

    #[error("Instrument {0} is not configured")]
    UnknownInstrument(Instrument),
}

pub type Result<T> = std::result::Result<T, StrategyError>;
