//! Shared Strategy Framework
//!
//! Common utilities and traits for trading strategy implementations.

pub mod logging;
pub mod metrics;
pub mod testing;
pub mod traits;

pub use logging::{init_strategy_logging, LogEmoji};
pub use metrics::*;
pub use testing::*;
pub use traits::*;
