//! Signal-side domain values: direction, regime, trading mode and the
//! pending/open trade records that move through the lifecycle.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::errors::ValidationError;
use super::identifiers::Instrument;

/// Trade direction. CALL profits from a rise, PUT from a fall.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Side {
    Call,
    Put,
}

impl Side {
    /// Signed price move in this side's favour
    pub fn favourable_move(&self, entry: f64, exit: f64) -> f64 {
        match self {
            Side::Call => exit - entry,
            Side::Put => entry - exit,
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Call => f.write_str("CALL"),
            Side::Put => f.write_str("PUT"),
        }
    }
}

/// Coarse market-behaviour label
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RegimeLabel {
    Flat,
    Side,
    Trend,
    Volatile,
    Unknown,
}

impl fmt::Display for RegimeLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            RegimeLabel::Flat => "FLAT",
            RegimeLabel::Side => "SIDE",
            RegimeLabel::Trend => "TREND",
            RegimeLabel::Volatile => "VOLATILE",
            RegimeLabel::Unknown => "UNKNOWN",
        };
        f.write_str(label)
    }
}

/// Per-instrument bias hint consumed by the decision branches
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TradingMode {
    #[default]
    Reversal,
    Breakout,
}

impl TradingMode {
    pub fn toggled(self) -> Self {
        match self {
            TradingMode::Reversal => TradingMode::Breakout,
            TradingMode::Breakout => TradingMode::Reversal,
        }
    }
}

impl fmt::Display for TradingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TradingMode::Reversal => f.write_str("REVERSAL"),
            TradingMode::Breakout => f.write_str("BREAKOUT"),
        }
    }
}

impl FromStr for TradingMode {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "REVERSAL" => Ok(TradingMode::Reversal),
            "BREAKOUT" => Ok(TradingMode::Breakout),
            _ => Err(ValidationError::UnknownLabel {
                kind: "trading mode",
                label: s.to_string(),
            }),
        }
    }
}

/// Resistance (LTB) and support (LTA) estimates extrapolated to the current index
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrendLines {
    pub resistance: f64,
    pub support: f64,
}

/// Accepted candidate waiting for the next promotion step
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PendingSignal {
    pub side: Side,
    pub reference_price: f64,
    pub timestamp: i64,
}

/// Simulated position, entered at the live price on promotion
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OpenTrade {
    pub side: Side,
    pub entry_price: f64,
    pub open_timestamp: i64,
}

/// Emission record kept for analytics and display
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignalEvent {
    pub instrument: Instrument,
    pub side: Side,
    pub price: f64,
    pub score: f64,
    pub regime: RegimeLabel,
    pub mode: TradingMode,
    pub rsi: f64,
    pub k: f64,
    pub d: f64,
    pub timestamp: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_favourable_move_sign() {
        assert!(Side::Call.favourable_move(1.0, 1.1) > 0.0);
        assert!(Side::Put.favourable_move(1.0, 1.1) < 0.0);
        assert!(Side::Put.favourable_move(1.0, 0.9) > 0.0);
    }

    #[test]
    fn test_mode_toggle_and_parse() {
        assert_eq!(TradingMode::Reversal.toggled(), TradingMode::Breakout);
        assert_eq!(TradingMode::Breakout.toggled(), TradingMode::Reversal);
        assert_eq!("breakout".parse::<TradingMode>().unwrap(), TradingMode::Breakout);
        assert!("sideways".parse::<TradingMode>().is_err());
    }

    #[test]
    fn test_labels_serialize_upper_case() {
        assert_eq!(serde_json::to_string(&Side::Call).unwrap(), "\"CALL\"");
        assert_eq!(serde_json::to_string(&RegimeLabel::Volatile).unwrap(), "\"VOLATILE\"");
        assert_eq!(RegimeLabel::Side.to_string(), "SIDE");
    }
}
