//! Closed-trade records and bankroll deltas

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

use super::identifiers::Instrument;
use super::signals::Side;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TradeResult {
    Win,
    Loss,
}

impl TradeResult {
    pub fn is_win(&self) -> bool {
        matches!(self, TradeResult::Win)
    }

    /// Bankroll delta for a fixed stake: `+stake * payout` on a win, `-stake` on a loss
    pub fn pnl(&self, stake: Decimal, payout: Decimal) -> Decimal {
        match self {
            TradeResult::Win => stake * payout,
            TradeResult::Loss => -stake,
        }
    }
}

impl fmt::Display for TradeResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TradeResult::Win => f.write_str("WIN"),
            TradeResult::Loss => f.write_str("LOSS"),
        }
    }
}

/// Immutable log entry, appended once per closed trade
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeRecord {
    pub instrument: Instrument,
    pub side: Side,
    pub result: TradeResult,
    pub entry_price: f64,
    pub exit_price: f64,
    pub timestamp: i64,
}

/// Outbound notification for a closed trade
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeCloseEvent {
    pub record: TradeRecord,
    pub pnl: Decimal,
    pub bankroll: Decimal,
}
