//! Coordinating engine
//!
//! Owns every instrument's mutable state (candles, live price, trade slot,
//! adaptive model) together with the ledger and the minute clock. All
//! mutation goes through `&mut self`, so a single task driving the engine is
//! the only writer.

use serde::Serialize;
use signal_config::BotConfig;
use std::collections::BTreeMap;
use std::sync::Arc;
use strategy_shared::{log_learn, log_network, log_profit, log_signal, log_trade, LogEmoji};
use strategy_shared::MetricsCollector;
use tracing::{debug, info, trace, warn};
use types::{
    is_valid_price, Candle, CandleSeries, CandleUpdateEvent, ConnectionEvent, FeedEvent,
    Instrument, LivePriceEvent, OpenTrade, PendingSignal, RegimeLabel, SignalEvent,
    TradeCloseEvent, TradeRecord, TradingMode, TrendLines,
};

use crate::adaptive::{AdaptiveModel, AdaptiveUpdate};
use crate::decision::{Decision, DecisionContext, DecisionEngine, WorkingSeries};
use crate::error::{Result, StrategyError};
use crate::indicators::{atr, ema, rsi, stoch_rsi, trend_lines, StochRsi};
use crate::lifecycle::{DailyStats, Ledger, Settlement, TradeSlot};
use crate::regime::{classify, suggest_mode};
use crate::scheduler::{MinuteClock, TickTime};

/// Indicator values recomputed on the slow tick, for display and logs
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InstrumentSnapshot {
    pub instrument: Instrument,
    pub live_price: Option<f64>,
    pub candles: usize,
    pub rsi: Option<f64>,
    pub stoch: Option<StochRsi>,
    pub atr: Option<f64>,
    pub ema_fast: Option<f64>,
    pub ema_slow: Option<f64>,
    pub lines: Option<TrendLines>,
    pub regime: RegimeLabel,
    pub mode: TradingMode,
    pub timestamp: i64,
}

/// Outbound notifications for display and persistence collaborators
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum EngineEvent {
    SignalEmitted(SignalEvent),
    TradeOpened {
        instrument: Instrument,
        trade: OpenTrade,
    },
    TradeClosed(TradeCloseEvent),
    TradeAborted {
        instrument: Instrument,
        reason: String,
    },
    ModelUpdated {
        instrument: Instrument,
        model: AdaptiveModel,
        update: AdaptiveUpdate,
    },
    ModeChanged {
        instrument: Instrument,
        mode: TradingMode,
    },
    DayRolled {
        day: String,
    },
}

#[derive(Debug, Clone)]
pub struct InstrumentState {
    pub series: CandleSeries,
    pub live_price: Option<f64>,
    pub slot: TradeSlot,
    pub model: AdaptiveModel,
    pub snapshot: Option<InstrumentSnapshot>,
}

impl InstrumentState {
    fn new(config: &BotConfig) -> Self {
        Self {
            series: CandleSeries::new(config.feed.max_candles),
            live_price: None,
            slot: TradeSlot::Idle,
            model: AdaptiveModel::from_config(&config.adaptive),
            snapshot: None,
        }
    }

    fn valid_live_price(&self) -> Option<f64> {
        self.live_price.filter(|p| is_valid_price(*p))
    }
}

pub struct SignalEngine {
    config: BotConfig,
    decision: DecisionEngine,
    instruments: BTreeMap<Instrument, InstrumentState>,
    ledger: Ledger,
    clock: MinuteClock,
    metrics: Arc<MetricsCollector>,
}

impl SignalEngine {
    pub fn new(config: BotConfig, metrics: Arc<MetricsCollector>) -> Self {
        let instruments = config
            .instruments
            .iter()
            .map(|&instrument| (instrument, InstrumentState::new(&config)))
            .collect();

        Self {
            decision: DecisionEngine::new(config.indicators.clone(), config.decision.clone()),
            ledger: Ledger::new(config.trading.stake, config.trading.payout),
            clock: MinuteClock::new(&config.trading),
            instruments,
            metrics,
            config,
        }
    }

    fn state_mut(&mut self, instrument: Instrument) -> Result<&mut InstrumentState> {
        self.instruments
            .get_mut(&instrument)
            .ok_or(StrategyError::UnknownInstrument(instrument))
    }

    /// Seed an instrument with bootstrap candles; the live price starts at
    /// the last close. Returns the number of candles retained.
    pub fn load_history(&mut self, instrument: Instrument, candles: Vec<Candle>) -> Result<usize> {
        let capacity = self.config.feed.max_candles;
        let state = self.state_mut(instrument)?;
        let offered = candles.len();
        state.series = CandleSeries::from_history(capacity, candles);
        if let Some(last) = state.series.last() {
            state.live_price = Some(last.close);
        }

        let retained = state.series.len();
        if retained < offered {
            debug!(%instrument, offered, retained, "History rows dropped or evicted");
        }
        info!(%instrument, candles = retained, "{} History loaded", LogEmoji::CHART);
        Ok(retained)
    }

    /// Apply one queued feed event. Invalid values are dropped here and never
    /// reach the candle series.
    pub fn apply_feed_event(&mut self, event: FeedEvent) {
        self.metrics.increment_feed_events();
        match event {
            FeedEvent::Price(LivePriceEvent { instrument, price }) => {
                if !is_valid_price(price) {
                    self.drop_event(instrument, "invalid live price");
                    return;
                }
                match self.instruments.get_mut(&instrument) {
                    Some(state) => state.live_price = Some(price),
                    None => self.drop_event(instrument, "unconfigured instrument"),
                }
            }
            FeedEvent::Candle(CandleUpdateEvent {
                instrument,
                candle,
                is_final,
            }) => {
                let Some(state) = self.instruments.get_mut(&instrument) else {
                    self.drop_event(instrument, "unconfigured instrument");
                    return;
                };
                let applied = if is_final {
                    state.series.push_closed(candle)
                } else {
                    state.series.update_forming(candle)
                };
                if let Err(e) = applied {
                    let error = StrategyError::MarketData {
                        instrument,
                        source: e,
                    };
                    debug!("Dropping candle update: {}", error);
                    self.metrics.increment_dropped();
                }
            }
            FeedEvent::Connection(ConnectionEvent::Open) => {
                log_network!("Feed connected");
            }
            FeedEvent::Connection(ConnectionEvent::Close { reason }) => {
                warn!(
                    "{} Feed closed: {}",
                    LogEmoji::WARNING,
                    reason.as_deref().unwrap_or("no reason")
                );
                self.metrics.increment_reconnects();
            }
            FeedEvent::Connection(ConnectionEvent::Error { message }) => {
                warn!("{} Feed error: {}", LogEmoji::ERROR, message);
                self.metrics.increment_reconnects();
                self.metrics.increment_errors();
            }
        }
    }

    fn drop_event(&self, instrument: Instrument, reason: &str) {
        debug!(%instrument, reason, "Dropping feed event");
        self.metrics.increment_dropped();
    }

    /// Fast tick: day boundary, the once-per-minute close, then promotion and
    /// evaluation inside the announce window.
    pub fn fast_tick(&mut self, now: &TickTime) -> Vec<EngineEvent> {
        let mut events = Vec::new();

        if self.ledger.roll_day(now.day()) {
            info!("{} New trading day {}: bankroll and trade log reset", LogEmoji::CLOCK, now.day());
            events.push(EngineEvent::DayRolled {
                day: now.day().to_string(),
            });
        }

        if self.clock.should_close(now) {
            self.close_open_trades(now, &mut events);
        }

        if self.clock.in_announce_window(now) {
            self.promote_pending(now, &mut events);
            self.evaluate_signals(now, &mut events);
        }

        events
    }

    /// PENDING -> OPEN for every armed instrument with a valid live price
    pub fn promote_pending(&mut self, now: &TickTime, events: &mut Vec<EngineEvent>) {
        for (&instrument, state) in self.instruments.iter_mut() {
            if !matches!(state.slot, TradeSlot::Pending(_)) {
                continue;
            }
            let Some(price) = state.valid_live_price() else {
                continue;
            };
            if let Some(trade) = state.slot.promote(price, now.epoch_ms) {
                self.metrics.increment_trades_opened();
                log_trade!("{} {} opened at {:.6}", instrument, trade.side, trade.entry_price);
                events.push(EngineEvent::TradeOpened { instrument, trade });
            }
        }
    }

    /// Run the decision engine for every idle instrument
    pub fn evaluate_signals(&mut self, now: &TickTime, events: &mut Vec<EngineEvent>) {
        let work_window = self.config.feed.work_window;

        for (&instrument, state) in self.instruments.iter_mut() {
            if !state.slot.is_idle() {
                continue;
            }
            let Some(live_price) = state.valid_live_price() else {
                continue;
            };

            let closes = state.series.closes();
            let regime = classify(&closes, &self.config.indicators, &self.config.regime).label;
            let working = WorkingSeries::new(&state.series, live_price, work_window);
            let ctx = DecisionContext {
                regime,
                thresholds: state.model.thresholds(),
                mode: state.model.mode,
            };

            let candidate = match self.decision.evaluate(&working, &ctx) {
                Decision::Signal(candidate) => candidate,
                Decision::Skip(reason) => {
                    trace!(%instrument, ?reason, %regime, "No signal");
                    continue;
                }
            };

            state.slot.arm(PendingSignal {
                side: candidate.side,
                reference_price: live_price,
                timestamp: now.epoch_ms,
            });
            self.metrics.increment_signals();

            let signal = SignalEvent {
                instrument,
                side: candidate.side,
                price: live_price,
                score: candidate.score,
                regime,
                mode: state.model.mode,
                rsi: candidate.rsi,
                k: candidate.stoch.k,
                d: candidate.stoch.d,
                timestamp: now.epoch_ms,
            };
            log_signal!(
                "{} {} @ {:.6} score {:.2} regime {} rsi {:.1} K {:.1} D {:.1} kOver {} kUnder {} minATR {:.2}",
                instrument,
                signal.side,
                live_price,
                signal.score,
                regime,
                signal.rsi,
                signal.k,
                signal.d,
                state.model.k_over,
                state.model.k_under,
                state.model.min_atr_multiplier
            );
            events.push(EngineEvent::SignalEmitted(signal));
        }
    }

    /// OPEN -> CLOSED for every open trade, at the current live price
    pub fn close_open_trades(&mut self, now: &TickTime, events: &mut Vec<EngineEvent>) {
        let atr_period = self.config.indicators.atr_period;

        for (&instrument, state) in self.instruments.iter_mut() {
            let Some(trade) = state.slot.take_open() else {
                continue;
            };

            let exit_price = state.live_price.unwrap_or(f64::NAN);
            let closes = state.series.closes();
            let min_move = atr(&closes, atr_period).unwrap_or(0.0) * state.model.min_atr_multiplier;

            let close = match self.ledger.settle(instrument, &trade, exit_price, min_move, now.epoch_ms) {
                Settlement::Recorded(close) => close,
                Settlement::Aborted { reason } => {
                    warn!(%instrument, "{} Close aborted: {}", LogEmoji::WARNING, reason);
                    self.metrics.increment_errors();
                    events.push(EngineEvent::TradeAborted {
                        instrument,
                        reason: reason.to_string(),
                    });
                    continue;
                }
            };

            let win = close.record.result.is_win();
            self.metrics.record_close(win);
            log_profit!(
                "{} {} {} entry {:.6} exit {:.6} pnl {} bankroll {}",
                instrument,
                close.record.side,
                close.record.result,
                close.record.entry_price,
                close.record.exit_price,
                close.pnl,
                close.bankroll
            );
            events.push(EngineEvent::TradeClosed(close));

            let results = self.ledger.recent_results(instrument);
            let update = state.model.update(&results, &self.config.adaptive);
            log_learn!(
                "{} wr20 {:.2} wr100 {:.2} wr10 {:.2} {:?} -> kOver {} kUnder {} rsiOver {} rsiUnder {} minATR {:.2}",
                instrument,
                update.win_rate_short,
                update.win_rate_long,
                update.win_rate_mode,
                update.adjustment,
                state.model.k_over,
                state.model.k_under,
                state.model.rsi_over,
                state.model.rsi_under,
                state.model.min_atr_multiplier
            );
            if update.mode_toggled {
                log_learn!("{} mode toggled to {}", instrument, state.model.mode);
                events.push(EngineEvent::ModeChanged {
                    instrument,
                    mode: state.model.mode,
                });
            }
            events.push(EngineEvent::ModelUpdated {
                instrument,
                model: state.model.clone(),
                update,
            });
        }
    }

    /// Slow tick: refresh snapshots and auto-adjust trading modes
    pub fn slow_tick(&mut self, now: &TickTime) -> Vec<EngineEvent> {
        let mut events = Vec::new();
        let ind = &self.config.indicators;
        let work_window = self.config.feed.work_window;
        let min_trend_candles = self.config.decision.min_trend_candles;

        for (&instrument, state) in self.instruments.iter_mut() {
            let closes = state.series.closes();
            let reading = classify(&closes, ind, &self.config.regime);
            let live_price = state.valid_live_price();

            let (rsi_now, stoch, lines) = match live_price {
                Some(lp) => {
                    let working = WorkingSeries::new(&state.series, lp, work_window);
                    (
                        rsi(&working.closes, ind.rsi_period),
                        stoch_rsi(
                            &working.closes,
                            ind.rsi_period,
                            ind.stoch_period,
                            ind.k_smooth,
                            ind.d_smooth,
                        ),
                        trend_lines(&working.highs, &working.lows, min_trend_candles),
                    )
                }
                None => (rsi(&closes, ind.rsi_period), None, None),
            };

            if let (Some(lp), Some(lines)) = (live_price, lines.as_ref()) {
                if let Some(mode) = suggest_mode(&closes, lp, lines, ind.rsi_period) {
                    if mode != state.model.mode {
                        state.model.mode = mode;
                        info!(%instrument, "{} Mode auto-adjusted to {}", LogEmoji::LEARN, mode);
                        events.push(EngineEvent::ModeChanged { instrument, mode });
                    }
                }
            }

            let snapshot = InstrumentSnapshot {
                instrument,
                live_price,
                candles: state.series.len(),
                rsi: rsi_now,
                stoch,
                atr: reading.atr.or_else(|| atr(&closes, ind.atr_period)),
                ema_fast: reading.ema_fast.or_else(|| ema(&closes, ind.ema_fast)),
                ema_slow: reading.ema_slow.or_else(|| ema(&closes, ind.ema_slow)),
                lines,
                regime: reading.label,
                mode: state.model.mode,
                timestamp: now.epoch_ms,
            };
            debug!(
                %instrument,
                regime = %snapshot.regime,
                mode = %snapshot.mode,
                rsi = ?snapshot.rsi,
                atr = ?snapshot.atr,
                "Snapshot"
            );
            state.snapshot = Some(snapshot);
        }

        events
    }

    pub fn bankroll(&self) -> rust_decimal::Decimal {
        self.ledger.bankroll()
    }

    pub fn records(&self) -> &[TradeRecord] {
        self.ledger.records()
    }

    pub fn daily_stats(&self, instrument: Instrument) -> DailyStats {
        self.ledger.stats(instrument)
    }

    pub fn model(&self, instrument: Instrument) -> Option<&AdaptiveModel> {
        self.instruments.get(&instrument).map(|s| &s.model)
    }

    pub fn models(&self) -> BTreeMap<Instrument, AdaptiveModel> {
        self.instruments
            .iter()
            .map(|(&instrument, state)| (instrument, state.model.clone()))
            .collect()
    }

    pub fn slot(&self, instrument: Instrument) -> Option<&TradeSlot> {
        self.instruments.get(&instrument).map(|s| &s.slot)
    }

    pub fn snapshot(&self, instrument: Instrument) -> Option<&InstrumentSnapshot> {
        self.instruments.get(&instrument).and_then(|s| s.snapshot.as_ref())
    }

    pub fn live_price(&self, instrument: Instrument) -> Option<f64> {
        self.instruments.get(&instrument).and_then(|s| s.live_price)
    }

    pub fn instrument(&self, instrument: Instrument) -> Option<&InstrumentState> {
        self.instruments.get(&instrument)
    }

    pub fn config(&self) -> &BotConfig {
        &self.config
    }
}
