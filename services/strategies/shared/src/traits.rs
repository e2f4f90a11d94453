//! Strategy traits and interfaces

use anyhow::Result;
use async_trait::async_trait;
use serde::Serialize;

/// Core strategy trait that all trading strategies must implement
#[async_trait]
pub trait Strategy: Send {
    /// Strategy name for identification
    fn name(&self) -> &'static str;

    /// Run the strategy until it is told to stop
    async fn start(&mut self) -> Result<()>;

    /// Stop the strategy
    async fn stop(&mut self) -> Result<()>;

    /// Get current strategy metrics
    fn metrics(&self) -> StrategyMetrics;
}

/// Basic strategy metrics
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StrategyMetrics {
    pub feed_events: u64,
    pub dropped_events: u64,
    pub signals_generated: u64,
    pub trades_opened: u64,
    pub trades_closed: u64,
    pub wins: u64,
    pub losses: u64,
    pub reconnects: u64,
    pub errors: u64,
}

impl StrategyMetrics {
    /// Lifetime win rate; 0 when nothing has closed yet
    pub fn win_rate(&self) -> f64 {
        if self.trades_closed == 0 {
            0.0
        } else {
            self.wins as f64 / self.trades_closed as f64
        }
    }
}
