//! # Instrument identifiers
//!
//! The bot tracks a fixed, small set of USDT spot pairs. Each variant owns its
//! exchange symbol so the feed adapter and the strategy agree on naming without
//! a registry.
//!
//! ```rust
//! use types::Instrument;
//!
//! let ada: Instrument = "adausdt".parse().unwrap();
//! assert_eq!(ada.symbol(), "ADAUSDT");
//! assert_eq!(ada.stream_name(), "adausdt");
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::errors::ValidationError;

/// Tracked trading pair
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Instrument {
    #[serde(rename = "ADAUSDT")]
    AdaUsdt,
    #[serde(rename = "XRPUSDT")]
    XrpUsdt,
    #[serde(rename = "ETHUSDT")]
    EthUsdt,
    #[serde(rename = "BTCUSDT")]
    BtcUsdt,
}

impl Instrument {
    /// Every supported instrument, in display order
    pub const ALL: [Instrument; 4] = [
        Instrument::AdaUsdt,
        Instrument::XrpUsdt,
        Instrument::EthUsdt,
        Instrument::BtcUsdt,
    ];

    /// Upper-case exchange symbol
    pub fn symbol(&self) -> &'static str {
        match self {
            Instrument::AdaUsdt => "ADAUSDT",
            Instrument::XrpUsdt => "XRPUSDT",
            Instrument::EthUsdt => "ETHUSDT",
            Instrument::BtcUsdt => "BTCUSDT",
        }
    }

    /// Lower-case name used in combined stream subscriptions
    pub fn stream_name(&self) -> String {
        self.symbol().to_ascii_lowercase()
    }
}

impl fmt::Display for Instrument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

impl FromStr for Instrument {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let upper = s.trim().to_ascii_uppercase();
        Instrument::ALL
            .into_iter()
            .find(|i| i.symbol() == upper)
            .ok_or(ValidationError::UnknownInstrument {
                symbol: s.to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_is_case_insensitive() {
        assert_eq!("btcusdt".parse::<Instrument>().unwrap(), Instrument::BtcUsdt);
        assert_eq!(" XRPUSDT ".parse::<Instrument>().unwrap(), Instrument::XrpUsdt);
    }

    #[test]
    fn test_unknown_symbol_rejected() {
        let err = "DOGEUSDT".parse::<Instrument>().unwrap_err();
        assert!(matches!(err, ValidationError::UnknownInstrument { .. }));
    }

    #[test]
    fn test_serde_uses_exchange_symbol() {
        let json = serde_json::to_string(&Instrument::EthUsdt).unwrap();
        assert_eq!(json, "\"ETHUSDT\"");
        let back: Instrument = serde_json::from_str(&json).unwrap();
        assert_eq!(back, Instrument::EthUsdt);
    }
}
