//! Strategy metrics collection

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

/// Thread-safe metrics collector for strategies
#[derive(Debug)]
pub struct MetricsCollector {
    start_time: Instant,
    feed_events: AtomicU64,
    dropped_events: AtomicU64,
    signals_generated: AtomicU64,
    trades_opened: AtomicU64,
    trades_closed: AtomicU64,
    wins: AtomicU64,
    losses: AtomicU64,
    reconnects: AtomicU64,
    errors: AtomicU64,
}

impl MetricsCollector {
    pub fn new() -> Self {
        Self {
            start_time: Instant::now(),
            feed_events: AtomicU64::new(0),
            dropped_events: AtomicU64::new(0),
            signals_generated: AtomicU64::new(0),
            trades_opened: AtomicU64::new(0),
            trades_closed: AtomicU64::new(0),
            wins: AtomicU64::new(0),
            losses: AtomicU64::new(0),
            reconnects: AtomicU64::new(0),
            errors: AtomicU64::new(0),
        }
    }

    pub fn increment_feed_events(&self) {
        self.feed_events.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_dropped(&self) {
        self.dropped_events.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_signals(&self) {
        self.signals_generated.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_trades_opened(&self) {
        self.trades_opened.fetch_add(1, Ordering::Relaxed);
    }

    /// Count a closed trade and its outcome
    pub fn record_close(&self, win: bool) {
        self.trades_closed.fetch_add(1, Ordering::Relaxed);
        if win {
            self.wins.fetch_add(1, Ordering::Relaxed);
        } else {
            self.losses.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn increment_reconnects(&self) {
        self.reconnects.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_errors(&self) {
        self.errors.fetch_add(1, Ordering::Relaxed);
    }

    pub fn get_metrics(&self) -> super::StrategyMetrics {
        super::StrategyMetrics {
            feed_events: self.feed_events.load(Ordering::Relaxed),
            dropped_events: self.dropped_events.load(Ordering::Relaxed),
            signals_generated: self.signals_generated.load(Ordering::Relaxed),
            trades_opened: self.trades_opened.load(Ordering::Relaxed),
            trades_closed: self.trades_closed.load(Ordering::Relaxed),
            wins: self.wins.load(Ordering::Relaxed),
            losses: self.losses.load(Ordering::Relaxed),
            reconnects: self.reconnects.load(Ordering::Relaxed),
            errors: self.errors.load(Ordering::Relaxed),
        }
    }

    pub fn uptime(&self) -> std::time::Duration {
        self.start_time.elapsed()
    }
}

impl Default for MetricsCollector {
    fn default() -> Self {
        Self::new()
    }
}
