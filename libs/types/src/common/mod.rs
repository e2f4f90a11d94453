//! Common domain types shared by the feed adapter and the strategy

pub mod errors;
pub mod feed;
pub mod identifiers;
pub mod market;
pub mod signals;
pub mod trades;

pub use errors::ValidationError;
pub use feed::{CandleUpdateEvent, ConnectionEvent, FeedEvent, LivePriceEvent};
pub use identifiers::Instrument;
pub use market::{is_valid_price, Candle, CandleSeries};
pub use signals::{OpenTrade, PendingSignal, RegimeLabel, Side, SignalEvent, TradingMode, TrendLines};
pub use trades::{TradeCloseEvent, TradeRecord, TradeResult};
