//! Error types for the feed adapter

use thiserror::Error;
use types::Instrument;

/// Result type alias for adapter operations
pub type Result<T> = std::result::Result<T, AdapterError>;

/// Main error type for feed and history operations
#[derive(Debug, Error)]
pub enum AdapterError {
    /// Connection-related errors
    #[error("Connection failed for {endpoint}: {reason}")]
    ConnectionFailed {
        /// Endpoint that refused or dropped the connection
        endpoint: String,
        /// Reason for the failure
        reason: String,
    },

    /// Connection timeout during the WebSocket handshake
    #[error("Connection timeout for {endpoint} after {timeout_ms}ms")]
    ConnectionTimeout {
        /// Endpoint that timed out
        endpoint: String,
        /// Timeout duration in milliseconds
        timeout_ms: u64,
    },

    /// Open stream went silent for too long
    #[error("No message received for {timeout_ms}ms")]
    IdleTimeout {
        /// Idle limit in milliseconds
        timeout_ms: u64,
    },

    /// Remote closed the stream
    #[error("Connection closed: {reason:?}")]
    ConnectionClosed {
        /// Close frame reason, if any
        reason: Option<String>,
    },

    /// Message processing errors
    #[error("Invalid message format: {0}")]
    InvalidMessage(String),

    /// JSON parsing error from exchange response
    #[error("Failed to parse JSON: {0}")]
    JsonParse(#[from] serde_json::Error),

    /// Required field missing from exchange message
    #[error("Missing required field: {field}")]
    MissingField {
        /// The field that was missing
        field: String,
    },

    /// Non-numeric, non-finite or negative price in exchange data
    #[error("Invalid numeric value: {value}")]
    InvalidNumeric {
        /// The value that couldn't be used
        value: String,
    },

    /// Symbol not in the tracked instrument set
    #[error("Invalid instrument: {0}")]
    InvalidInstrument(String),

    /// History request failed for one instrument
    #[error("History unavailable for {instrument}: {reason}")]
    HistoryUnavailable {
        /// Instrument whose bootstrap failed
        instrument: Instrument,
        /// Underlying failure
        reason: String,
    },

    /// HTTP transport error
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// System errors
    #[error("WebSocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),

    /// Malformed endpoint URL
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// I/O error during network operations
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error in adapter settings
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Strategy side of the event queue has gone away
    #[error("Event queue closed")]
    ChannelClosed,
}

impl AdapterError {
    /// Check if this error is recoverable through retry
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            AdapterError::ConnectionFailed { .. }
                | AdapterError::ConnectionTimeout { .. }
                | AdapterError::IdleTimeout { .. }
                | AdapterError::ConnectionClosed { .. }
                | AdapterError::InvalidMessage(_)
                | AdapterError::JsonParse(_)
                | AdapterError::InvalidNumeric { .. }
                | AdapterError::HistoryUnavailable { .. }
                | AdapterError::Http(_)
                | AdapterError::WebSocket(_)
                | AdapterError::Io(_)
        )
    }

    /// Check if this error indicates a permanent failure
    pub fn is_permanent(&self) -> bool {
        matches!(
            self,
            AdapterError::Configuration(_)
                | AdapterError::InvalidUrl(_)
                | AdapterError::ChannelClosed
        )
    }
}
