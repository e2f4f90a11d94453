//! # Stoch Signals Strategy - Stochastic-RSI Signal Generation
//!
//! ## Purpose
//!
//! Minute-candle signal bot for a fixed set of USDT pairs. Each instrument is
//! classified into a market regime, evaluated against a per-regime branch
//! table of stochastic-RSI, RSI and trend-line conditions, and every accepted
//! signal is followed by a simulated fixed-stake trade that opens on the next
//! scheduler step and closes at the following minute boundary.
//!
//! ## Architecture Role
//!
//! ```text
//! FeedSession ──FeedEvent queue──▶ [SignalEngine] ──EngineEvent queue──▶ display / persistence
//!                                    │
//!          indicators → regime → decision → lifecycle → adaptive model
//! ```
//!
//! ## Components
//!
//! - [`indicators`]: RSI, stochastic RSI, ATR, EMA and pivot trend lines
//! - [`regime`]: FLAT / SIDE / TREND / VOLATILE / UNKNOWN classification and
//!   the REVERSAL / BREAKOUT mode hint
//! - [`decision`] and [`scoring`]: branch table, confidence score, macro filter
//! - [`lifecycle`]: IDLE → PENDING → OPEN → IDLE slot and the daily ledger
//! - [`adaptive`]: bounded hill-climbing thresholds driven by rolling win rate
//! - [`scheduler`]: announce window and the once-per-minute close guard
//! - [`engine`]: per-instrument state owner tying the above together
//! - [`strategy`]: tokio scheduler loop implementing the shared `Strategy` trait
//!
//! ## Example
//!
//! ```rust
//! use stoch_signals::indicators::{rsi, stoch_rsi};
//!
//! let closes: Vec<f64> = (0..40).map(|i| 1.0 + (i as f64 * 0.4).sin() * 0.01).collect();
//! let now = rsi(&closes, 14).unwrap();
//! assert!((0.0..=100.0).contains(&now));
//! assert!(stoch_rsi(&closes, 14, 14, 3, 3).is_some());
//! ```

pub mod adaptive;
pub mod decision;
pub mod engine;
pub mod error;
pub mod indicators;
pub mod lifecycle;
pub mod regime;
pub mod scheduler;
pub mod scoring;
pub mod strategy;

pub use adaptive::{AdaptiveModel, AdaptiveUpdate, Adjustment, Thresholds};
pub use decision::{Candidate, Decision, DecisionContext, DecisionEngine, SkipReason, WorkingSeries};
pub use engine::{EngineEvent, InstrumentSnapshot, SignalEngine};
pub use error::{Result, StrategyError};
pub use lifecycle::{DailyStats, Ledger, Settlement, TradeSlot};
pub use scheduler::{MinuteClock, TickTime};
pub use strategy::StochSignalStrategy;

pub use rust_decimal::Decimal;
