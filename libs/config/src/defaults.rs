//! Default values and constants
//!
//! Every configurable knob has its default here so that the config structs,
//! tests and documentation agree on one number.

/// Indicator periods
pub mod indicators {
    pub const RSI_PERIOD: usize = 14;
    pub const STOCH_PERIOD: usize = 14;
    pub const K_SMOOTH: usize = 3;
    pub const D_SMOOTH: usize = 3;
    pub const ATR_PERIOD: usize = 14;
    pub const EMA_FAST: usize = 50;
    pub const EMA_SLOW: usize = 200;
}

/// Regime classifier thresholds (fixed, never learned)
pub mod regime {
    /// Candles required before any label other than UNKNOWN
    pub const MIN_CANDLES: usize = 100;
    /// ATR below this is a FLAT market
    pub const FLAT_ATR: f64 = 0.0002;
    pub const TREND_EMA_DIFF: f64 = 0.001;
    pub const TREND_RSI_RANGE: f64 = 25.0;
    pub const SIDE_EMA_DIFF: f64 = 0.0005;
    pub const SIDE_RSI_RANGE: f64 = 20.0;
    /// Number of trailing RSI values whose max-min is `rsiRange`
    pub const RSI_RANGE_LOOKBACK: usize = 10;
}

/// Signal decision engine
pub mod decision {
    /// Absolute ATR floor under which no candidate is evaluated
    pub const DEAD_MARKET_ATR: f64 = 0.00015;
    /// Relative distance to a trend line that counts as "near"
    pub const NEAR_BAND: f64 = 0.0012;
    pub const VOLATILE_K_OVER: f64 = 95.0;
    pub const VOLATILE_K_UNDER: f64 = 5.0;
    pub const VOLATILE_RSI_OVER: f64 = 70.0;
    pub const VOLATILE_RSI_UNDER: f64 = 30.0;
    pub const MIN_TREND_CANDLES: usize = 20;

    pub const WEIGHT_KD_AGREEMENT: f64 = 0.30;
    pub const WEIGHT_RSI_EXTREME: f64 = 0.20;
    pub const WEIGHT_EMA_ALIGNMENT: f64 = 0.10;
    pub const WEIGHT_PROXIMITY: f64 = 0.20;
    pub const WEIGHT_VOLATILITY: f64 = 0.20;

    /// ATR adequacy score is `(atr - floor) / span` clamped to [0, 1]
    pub const ATR_SCORE_FLOOR: f64 = 0.0001;
    pub const ATR_SCORE_SPAN: f64 = 0.0005;
}

/// Simulated trading
pub mod trading {
    pub const ANNOUNCE_START_SECOND: u32 = 1;
    pub const ANNOUNCE_END_SECOND: u32 = 25;
    pub const EXIT_SECOND: u32 = 0;
}

/// Adaptive thresholds
pub mod adaptive {
    pub const K_OVER: f64 = 95.0;
    pub const K_UNDER: f64 = 5.0;
    pub const RSI_OVER: f64 = 70.0;
    pub const RSI_UNDER: f64 = 30.0;
    pub const MIN_ATR_MULTIPLIER: f64 = 0.20;

    pub const K_OVER_BOUNDS: (f64, f64) = (90.0, 99.0);
    pub const K_UNDER_BOUNDS: (f64, f64) = (1.0, 10.0);
    pub const RSI_OVER_BOUNDS: (f64, f64) = (55.0, 80.0);
    pub const RSI_UNDER_BOUNDS: (f64, f64) = (20.0, 45.0);
    pub const MIN_ATR_BOUNDS: (f64, f64) = (0.12, 0.50);

    pub const THRESHOLD_STEP: f64 = 1.0;
    pub const MIN_ATR_STEP: f64 = 0.05;
    pub const LOW_WIN_RATE: f64 = 0.50;
    pub const HIGH_WIN_RATE: f64 = 0.70;
    pub const SHORT_WINDOW: usize = 20;
    pub const LONG_WINDOW: usize = 100;
    pub const MODE_WINDOW: usize = 10;
}

/// Binance feed session
pub mod feed {
    pub const WS_URL: &str = "wss://stream.binance.com:9443/stream";
    pub const REST_URL: &str = "https://api.binance.com/api/v3/klines";
    pub const INTERVAL: &str = "1m";
    pub const HISTORY_CANDLES: usize = 300;
    pub const MAX_CANDLES: usize = 500;
    pub const WORK_WINDOW: usize = 250;
    pub const BACKOFF_MS: [u64; 5] = [1_000, 2_000, 5_000, 8_000, 12_000];
    pub const CONNECT_TIMEOUT_MS: u64 = 10_000;
    pub const IDLE_TIMEOUT_MS: u64 = 90_000;
    pub const REQUEST_TIMEOUT_MS: u64 = 10_000;
    pub const QUEUE_CAPACITY: usize = 4_096;
}

/// Scheduler cadence
pub mod scheduler {
    pub const FAST_TICK_MS: u64 = 100;
    pub const SLOW_TICK_MS: u64 = 1_000;
    pub const METRICS_INTERVAL_SECS: u64 = 60;
}
