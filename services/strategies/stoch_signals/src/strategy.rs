//! Scheduler loop driving the signal engine
//!
//! One task owns the [`SignalEngine`]. Feed events queue up on a bounded
//! channel and are drained in arrival order at the start of every tick, so
//! the engine never sees concurrent mutation.

use anyhow::Result;
use async_trait::async_trait;
use signal_config::BotConfig;
use std::sync::Arc;
use std::time::Duration;
use strategy_shared::{log_metrics, LogEmoji, MetricsCollector, Strategy, StrategyMetrics};
use tokio::sync::mpsc::error::{TryRecvError, TrySendError};
use tokio::sync::{mpsc, watch};
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info, warn};
use types::{Candle, FeedEvent, Instrument};

use crate::engine::{EngineEvent, SignalEngine};
use crate::scheduler::TickTime;

pub struct StochSignalStrategy {
    engine: SignalEngine,
    feed_rx: mpsc::Receiver<FeedEvent>,
    events_tx: mpsc::Sender<EngineEvent>,
    shutdown: watch::Receiver<bool>,
    metrics: Arc<MetricsCollector>,
    feed_open: bool,
}

impl StochSignalStrategy {
    pub fn new(
        config: BotConfig,
        feed_rx: mpsc::Receiver<FeedEvent>,
        events_tx: mpsc::Sender<EngineEvent>,
        shutdown: watch::Receiver<bool>,
    ) -> Self {
        let metrics = Arc::new(MetricsCollector::new());
        Self {
            engine: SignalEngine::new(config, metrics.clone()),
            feed_rx,
            events_tx,
            shutdown,
            metrics,
            feed_open: true,
        }
    }

    pub fn engine(&self) -> &SignalEngine {
        &self.engine
    }

    /// Seed bootstrap history; failures are logged and the instrument starts empty
    pub fn load_history(&mut self, histories: impl IntoIterator<Item = (Instrument, Vec<Candle>)>) {
        for (instrument, candles) in histories {
            if let Err(e) = self.engine.load_history(instrument, candles) {
                warn!(%instrument, "{} History rejected: {}", LogEmoji::WARNING, e);
            }
        }
    }

    /// Apply every queued feed event in arrival order
    fn drain_feed(&mut self) {
        while self.feed_open {
            match self.feed_rx.try_recv() {
                Ok(event) => self.engine.apply_feed_event(event),
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    warn!("{} Feed queue closed, continuing without market data", LogEmoji::WARNING);
                    self.feed_open = false;
                }
            }
        }
    }

    fn publish(&self, events: Vec<EngineEvent>) {
        for event in events {
            match self.events_tx.try_send(event) {
                Ok(()) => {}
                Err(TrySendError::Full(event)) => {
                    warn!("Outbound queue full, dropping {:?}", event);
                    self.metrics.increment_dropped();
                }
                Err(TrySendError::Closed(_)) => {
                    debug!("Outbound queue closed");
                }
            }
        }
    }

    fn log_summary(&self) {
        let m = self.metrics.get_metrics();
        log_metrics!(
            "feed {} dropped {} signals {} opened {} closed {} (W {} / L {}) reconnects {} bankroll {}",
            m.feed_events,
            m.dropped_events,
            m.signals_generated,
            m.trades_opened,
            m.trades_closed,
            m.wins,
            m.losses,
            m.reconnects,
            self.engine.bankroll()
        );
    }
}

#[async_trait]
impl Strategy for StochSignalStrategy {
    fn name(&self) -> &'static str {
        "stoch_signals"
    }

    async fn start(&mut self) -> Result<()> {
        let scheduler = self.engine.config().scheduler.clone();
        let mut fast = interval(Duration::from_millis(scheduler.fast_tick_ms));
        let mut slow = interval(Duration::from_millis(scheduler.slow_tick_ms));
        let mut summary = interval(Duration::from_secs(scheduler.metrics_interval_secs));
        for timer in [&mut fast, &mut slow, &mut summary] {
            timer.set_missed_tick_behavior(MissedTickBehavior::Skip);
        }

        info!(
            "{} Scheduler running: fast {}ms, slow {}ms",
            LogEmoji::CLOCK,
            scheduler.fast_tick_ms,
            scheduler.slow_tick_ms
        );

        loop {
            tokio::select! {
                _ = fast.tick() => {
                    self.drain_feed();
                    let events = self.engine.fast_tick(&TickTime::now());
                    self.publish(events);
                }
                _ = slow.tick() => {
                    self.drain_feed();
                    let events = self.engine.slow_tick(&TickTime::now());
                    self.publish(events);
                }
                _ = summary.tick() => {
                    self.log_summary();
                }
                changed = self.shutdown.changed() => {
                    if changed.is_err() || *self.shutdown.borrow() {
                        break;
                    }
                }
            }
        }

        info!("Scheduler stopped");
        Ok(())
    }

    async fn stop(&mut self) -> Result<()> {
        self.drain_feed();
        self.log_summary();
        Ok(())
    }

    fn metrics(&self) -> StrategyMetrics {
        self.metrics.get_metrics()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use adapter_service::bootstrap_history;
    use signal_config::SchedulerConfig;
    use strategy_shared::{candles_from_closes, MockHistoryProvider};
    use types::LivePriceEvent;

    fn fast_config() -> BotConfig {
        BotConfig {
            scheduler: SchedulerConfig {
                fast_tick_ms: 5,
                slow_tick_ms: 10,
                metrics_interval_secs: 60,
            },
            ..BotConfig::default()
        }
    }

    #[tokio::test]
    async fn test_drains_feed_and_stops_on_shutdown() {
        let (feed_tx, feed_rx) = mpsc::channel(16);
        let (events_tx, _events_rx) = mpsc::channel(16);
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let mut strategy = StochSignalStrategy::new(fast_config(), feed_rx, events_tx, shutdown_rx);
        strategy.load_history([(
            Instrument::AdaUsdt,
            candles_from_closes(&[0.5, 0.51, 0.52], 0.001, 0),
        )]);

        for price in [0.53, 0.54] {
            feed_tx
                .send(FeedEvent::Price(LivePriceEvent {
                    instrument: Instrument::AdaUsdt,
                    price,
                }))
                .await
                .unwrap();
        }

        let handle = tokio::spawn(async move {
            strategy.start().await.unwrap();
            strategy
        });
        tokio::time::sleep(Duration::from_millis(50)).await;
        shutdown_tx.send(true).unwrap();

        let strategy = tokio::time::timeout(Duration::from_secs(2), handle)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(strategy.metrics().feed_events, 2);
        assert_eq!(strategy.engine().live_price(Instrument::AdaUsdt), Some(0.54));
        assert!(strategy.engine().snapshot(Instrument::AdaUsdt).is_some());
    }

    #[tokio::test]
    async fn test_bootstrap_survives_failed_instrument() {
        let provider = MockHistoryProvider::new()
            .with_history(Instrument::EthUsdt, candles_from_closes(&[2000.0; 400], 1.0, 0))
            .with_history(Instrument::AdaUsdt, candles_from_closes(&[0.4; 10], 0.001, 0))
            .with_failure(Instrument::BtcUsdt);
        let config = fast_config();
        let histories =
            bootstrap_history(&provider, &config.instruments, config.feed.history_candles).await;

        let (_feed_tx, feed_rx) = mpsc::channel(4);
        let (events_tx, _events_rx) = mpsc::channel(4);
        let (_shutdown_tx, shutdown_rx) = watch::channel(false);
        let mut strategy = StochSignalStrategy::new(config, feed_rx, events_tx, shutdown_rx);
        strategy.load_history(histories);

        let engine = strategy.engine();
        assert_eq!(engine.instrument(Instrument::EthUsdt).unwrap().series.len(), 300);
        assert_eq!(engine.instrument(Instrument::AdaUsdt).unwrap().series.len(), 10);
        assert!(engine.instrument(Instrument::BtcUsdt).unwrap().series.is_empty());
        assert_eq!(engine.live_price(Instrument::BtcUsdt), None);
        assert_eq!(engine.live_price(Instrument::EthUsdt), Some(2000.0));
    }

    #[tokio::test]
    async fn test_closed_feed_is_not_fatal() {
        let (feed_tx, feed_rx) = mpsc::channel(4);
        let (events_tx, _events_rx) = mpsc::channel(4);
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        drop(feed_tx);

        let mut strategy = StochSignalStrategy::new(fast_config(), feed_rx, events_tx, shutdown_rx);
        let handle = tokio::spawn(async move {
            let result = strategy.start().await;
            (strategy, result)
        });
        tokio::time::sleep(Duration::from_millis(30)).await;
        drop(shutdown_tx);

        let (mut strategy, result) = handle.await.unwrap();
        tokio_test::assert_ok!(result);
        assert!(!strategy.feed_open);
        tokio_test::assert_ok!(strategy.stop().await);
        assert_eq!(strategy.name(), "stoch_signals");
    }
}
