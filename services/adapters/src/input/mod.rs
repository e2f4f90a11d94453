//! Input side of the feed: wire parsing, the streaming session and history bootstrap

pub mod collectors;
pub mod components;
pub mod connection;
pub mod history;

pub use connection::{ConnectionState, FeedSession, SessionConfig, SessionStats};
pub use history::{bootstrap_history, BinanceRestHistory, HistoryProvider};
