//! Trade lifecycle: per-instrument slot state machine and the daily ledger
//!
//! ```text
//! IDLE --accept--> PENDING --promote--> OPEN --minute close--> IDLE
//! ```
//!
//! The slot holds at most one of a pending signal or an open trade. A close
//! produces one bankroll delta together with one record, or neither.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::Serialize;
use std::collections::BTreeMap;
use types::{
    Instrument, OpenTrade, PendingSignal, Side, TradeCloseEvent, TradeRecord, TradeResult,
};

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum TradeSlot {
    #[default]
    Idle,
    Pending(PendingSignal),
    Open(OpenTrade),
}

impl TradeSlot {
    pub fn is_idle(&self) -> bool {
        matches!(self, TradeSlot::Idle)
    }

    /// IDLE -> PENDING. Returns false when the slot is busy.
    pub fn arm(&mut self, signal: PendingSignal) -> bool {
        if !self.is_idle() {
            return false;
        }
        *self = TradeSlot::Pending(signal);
        true
    }

    /// PENDING -> OPEN at the current live price
    pub fn promote(&mut self, live_price: f64, now_ms: i64) -> Option<OpenTrade> {
        let TradeSlot::Pending(signal) = *self else {
            return None;
        };
        let trade = OpenTrade {
            side: signal.side,
            entry_price: live_price,
            open_timestamp: now_ms,
        };
        *self = TradeSlot::Open(trade);
        Some(trade)
    }

    /// OPEN -> IDLE, handing the trade to the caller for settlement
    pub fn take_open(&mut self) -> Option<OpenTrade> {
        let TradeSlot::Open(trade) = *self else {
            return None;
        };
        *self = TradeSlot::Idle;
        Some(trade)
    }
}

/// WIN only when the move in the trade's favour exceeds `min_move`.
///
/// `None` when either price is not finite.
pub fn outcome(side: Side, entry: f64, exit: f64, min_move: f64) -> Option<TradeResult> {
    if !entry.is_finite() || !exit.is_finite() {
        return None;
    }
    if side.favourable_move(entry, exit) > min_move {
        Some(TradeResult::Win)
    } else {
        Some(TradeResult::Loss)
    }
}

/// Per-instrument counters for the current day
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DailyStats {
    pub wins: u32,
    pub losses: u32,
}

impl DailyStats {
    pub fn total(&self) -> u32 {
        self.wins + self.losses
    }

    pub fn win_rate(&self) -> Option<f64> {
        match self.total() {
            0 => None,
            total => Some(self.wins as f64 / total as f64),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Settlement {
    Recorded(TradeCloseEvent),
    Aborted { reason: &'static str },
}

/// Bankroll, trade log and daily counters; all reset at the day boundary
#[derive(Debug, Clone)]
pub struct Ledger {
    stake: Decimal,
    payout: Decimal,
    day: Option<NaiveDate>,
    bankroll: Decimal,
    records: Vec<TradeRecord>,
    stats: BTreeMap<Instrument, DailyStats>,
}

impl Ledger {
    pub fn new(stake: Decimal, payout: Decimal) -> Self {
        Self {
            stake,
            payout,
            day: None,
            bankroll: dec!(0),
            records: Vec::new(),
            stats: BTreeMap::new(),
        }
    }

    /// Reset for a new calendar day. Returns true when `day` differs from the
    /// current one; the first call only sets the day.
    pub fn roll_day(&mut self, day: NaiveDate) -> bool {
        match self.day {
            Some(current) if current == day => false,
            Some(_) => {
                self.day = Some(day);
                self.bankroll = dec!(0);
                self.records.clear();
                self.stats.clear();
                true
            }
            None => {
                self.day = Some(day);
                false
            }
        }
    }

    /// Close `trade` at `exit_price`, appending a record and a bankroll delta
    /// together, or neither when a price is invalid.
    pub fn settle(
        &mut self,
        instrument: Instrument,
        trade: &OpenTrade,
        exit_price: f64,
        min_move: f64,
        now_ms: i64,
    ) -> Settlement {
        let Some(result) = outcome(trade.side, trade.entry_price, exit_price, min_move) else {
            return Settlement::Aborted {
                reason: "non-finite entry or exit price",
            };
        };

        let pnl = result.pnl(self.stake, self.payout);
        self.bankroll += pnl;

        let record = TradeRecord {
            instrument,
            side: trade.side,
            result,
            entry_price: trade.entry_price,
            exit_price,
            timestamp: now_ms,
        };
        self.records.push(record.clone());

        let stats = self.stats.entry(instrument).or_default();
        match result {
            TradeResult::Win => stats.wins += 1,
            TradeResult::Loss => stats.losses += 1,
        }

        Settlement::Recorded(TradeCloseEvent {
            record,
            pnl,
            bankroll: self.bankroll,
        })
    }

    /// Results for one instrument, oldest first
    pub fn recent_results(&self, instrument: Instrument) -> Vec<TradeResult> {
        self.records
            .iter()
            .filter(|r| r.instrument == instrument)
            .map(|r| r.result)
            .collect()
    }

    pub fn bankroll(&self) -> Decimal {
        self.bankroll
    }

    pub fn records(&self) -> &[TradeRecord] {
        &self.records
    }

    pub fn stats(&self, instrument: Instrument) -> DailyStats {
        self.stats.get(&instrument).copied().unwrap_or_default()
    }

    pub fn day(&self) -> Option<NaiveDate> {
        self.day
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pending(side: Side) -> PendingSignal {
        PendingSignal {
            side,
            reference_price: 1.0,
            timestamp: 0,
        }
    }

    #[test]
    fn test_slot_transitions() {
        let mut slot = TradeSlot::default();
        assert!(slot.promote(1.0, 0).is_none());
        assert!(slot.take_open().is_none());

        assert!(slot.arm(pending(Side::Call)));
        assert!(!slot.arm(pending(Side::Put)));

        let trade = slot.promote(1.05, 10).unwrap();
        assert_eq!(trade.entry_price, 1.05);
        assert_eq!(trade.side, Side::Call);
        assert!(!slot.arm(pending(Side::Put)));
        assert!(slot.promote(2.0, 11).is_none());

        assert_eq!(slot.take_open(), Some(trade));
        assert!(slot.is_idle());
    }

    #[test]
    fn test_outcome_noise_floor() {
        assert_eq!(outcome(Side::Call, 1.0, 1.002, 0.001), Some(TradeResult::Win));
        assert_eq!(outcome(Side::Call, 1.0, 1.0005, 0.001), Some(TradeResult::Loss));
        assert_eq!(outcome(Side::Put, 1.0, 0.998, 0.001), Some(TradeResult::Win));
        assert_eq!(outcome(Side::Put, 1.0, 1.002, 0.001), Some(TradeResult::Loss));
        assert_eq!(outcome(Side::Call, f64::NAN, 1.0, 0.001), None);
        assert_eq!(outcome(Side::Call, 1.0, f64::INFINITY, 0.001), None);
    }

    #[test]
    fn test_settle_updates_bankroll_and_log_together() {
        let mut ledger = Ledger::new(dec!(1.00), dec!(0.89));
        let trade = OpenTrade {
            side: Side::Put,
            entry_price: 1.0,
            open_timestamp: 0,
        };

        let Settlement::Recorded(event) = ledger.settle(Instrument::XrpUsdt, &trade, 0.99, 0.001, 60_000)
        else {
            panic!("expected a recorded close");
        };
        assert_eq!(event.record.result, TradeResult::Win);
        assert_eq!(event.pnl, dec!(0.89));

        ledger.settle(Instrument::XrpUsdt, &trade, 1.01, 0.001, 120_000);
        assert_eq!(ledger.bankroll(), dec!(-0.11));
        assert_eq!(ledger.records().len(), 2);
        assert_eq!(
            ledger.recent_results(Instrument::XrpUsdt),
            vec![TradeResult::Win, TradeResult::Loss]
        );
        assert!(ledger.recent_results(Instrument::BtcUsdt).is_empty());
        assert_eq!(ledger.stats(Instrument::XrpUsdt).win_rate(), Some(0.5));
    }

    #[test]
    fn test_invalid_prices_abort_without_side_effects() {
        let mut ledger = Ledger::new(dec!(1.00), dec!(0.89));
        let trade = OpenTrade {
            side: Side::Call,
            entry_price: f64::NAN,
            open_timestamp: 0,
        };
        assert!(matches!(
            ledger.settle(Instrument::AdaUsdt, &trade, 1.0, 0.0, 0),
            Settlement::Aborted { .. }
        ));
        assert_eq!(ledger.bankroll(), dec!(0));
        assert!(ledger.records().is_empty());
        assert_eq!(ledger.stats(Instrument::AdaUsdt).total(), 0);
    }

    #[test]
    fn test_day_roll_resets_everything() {
        let mut ledger = Ledger::new(dec!(1.00), dec!(0.89));
        let d1 = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();
        let d2 = NaiveDate::from_ymd_opt(2024, 5, 2).unwrap();

        assert!(!ledger.roll_day(d1));
        let trade = OpenTrade {
            side: Side::Call,
            entry_price: 1.0,
            open_timestamp: 0,
        };
        ledger.settle(Instrument::EthUsdt, &trade, 0.9, 0.0, 0);
        assert!(!ledger.roll_day(d1));
        assert_eq!(ledger.bankroll(), dec!(-1.00));

        assert!(ledger.roll_day(d2));
        assert_eq!(ledger.bankroll(), dec!(0));
        assert!(ledger.records().is_empty());
        assert_eq!(ledger.stats(Instrument::EthUsdt), DailyStats::default());
        assert_eq!(ledger.day(), Some(d2));
    }
}
