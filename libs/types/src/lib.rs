//! # Signal Bot Types
//!
//! Domain types shared by every crate in the workspace.
//!
//! - **Instruments**: the fixed set of tracked USDT pairs ([`Instrument`])
//! - **Market data**: [`Candle`] and the bounded, strictly ordered [`CandleSeries`]
//! - **Feed events**: what the streaming session pushes onto the strategy queue
//! - **Signals and trades**: [`Side`], [`RegimeLabel`], [`TradingMode`], pending/open
//!   trades and the append-only [`TradeRecord`] log entries
//!
//! Prices are `f64` because every indicator works in floating point; bankroll
//! amounts are `rust_decimal::Decimal` so repeated stake arithmetic stays exact.

pub mod common;

pub use common::*;
pub use rust_decimal::Decimal;
