//! WebSocket feed session with automatic reconnection
//!
//! The session owns the streaming connection and pushes every parsed event onto
//! a bounded queue in arrival order. Failures become [`ConnectionEvent`]s plus a
//! backoff sleep; nothing is returned to the consumer, and there is no retry
//! limit. The session only stops on shutdown or when the queue's receiver is
//! dropped.

use futures_util::StreamExt;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::time::timeout;
use tokio_tungstenite::{connect_async, tungstenite::Message};
use tracing::{debug, error, info, warn};
use types::{ConnectionEvent, FeedEvent, Instrument};

use super::collectors::binance::{combined_stream_url, parse_stream_message};
use crate::backoff::ReconnectBackoff;
use crate::{AdapterError, Result};

/// Connection states for WebSocket lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// Not connected
    Disconnected,
    /// Attempting to connect
    Connecting,
    /// Successfully connected and receiving data
    Connected,
    /// Waiting out a backoff delay before the next attempt
    Reconnecting,
}

/// Configuration for the feed session
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Combined-stream base URL
    pub url: String,
    pub instruments: Vec<Instrument>,
    /// Kline interval, e.g. `1m`
    pub interval: String,
    pub connect_timeout: Duration,
    /// No message for this long on an open stream forces a reconnect
    pub idle_timeout: Duration,
    pub backoff_ms: Vec<u64>,
}

impl SessionConfig {
    pub fn from_feed(feed: &signal_config::FeedConfig, instruments: &[Instrument]) -> Self {
        Self {
            url: feed.ws_url.clone(),
            instruments: instruments.to_vec(),
            interval: feed.interval.clone(),
            connect_timeout: feed.connect_timeout(),
            idle_timeout: feed.idle_timeout(),
            backoff_ms: feed.backoff_ms.clone(),
        }
    }
}

/// Counters exposed after the session ends, mostly for tests and shutdown logs
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionStats {
    pub connections: u64,
    pub failures: u64,
    pub dropped_messages: u64,
}

/// Streaming session feeding the strategy queue
pub struct FeedSession {
    config: SessionConfig,
    sender: mpsc::Sender<FeedEvent>,
    state: ConnectionState,
    backoff: ReconnectBackoff,
    stats: SessionStats,
}

impl FeedSession {
    pub fn new(config: SessionConfig, sender: mpsc::Sender<FeedEvent>) -> Self {
        let backoff = ReconnectBackoff::new(&config.backoff_ms);
        Self {
            config,
            sender,
            state: ConnectionState::Disconnected,
            backoff,
            stats: SessionStats::default(),
        }
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    /// Run until shutdown is signalled or the queue receiver is dropped
    pub async fn run(mut self, mut shutdown: watch::Receiver<bool>) -> SessionStats {
        let url = match combined_stream_url(
            &self.config.url,
            &self.config.instruments,
            &self.config.interval,
        ) {
            Ok(url) => url,
            Err(e) => {
                error!("❌ Cannot build stream URL: {}", e);
                return self.stats;
            }
        };

        loop {
            if *shutdown.borrow() {
                break;
            }

            let outcome = tokio::select! {
                outcome = self.connect_and_stream(url.as_str()) => outcome,
                _ = shutdown.changed() => break,
            };

            let Some(event) = self.lifecycle_event(outcome) else {
                info!("Event queue closed, stopping feed session");
                break;
            };

            if self.emit(FeedEvent::Connection(event)).await.is_err() {
                break;
            }

            self.state = ConnectionState::Reconnecting;
            let delay = self.backoff.next_delay();
            warn!(
                "⏳ Reconnecting in {}ms (attempt {})",
                delay.as_millis(),
                self.backoff.attempts()
            );

            tokio::select! {
                _ = tokio::time::sleep(delay) => {}
                _ = shutdown.changed() => break,
            }
        }

        self.state = ConnectionState::Disconnected;
        info!(
            "Feed session stopped: {} connections, {} failures, {} dropped messages",
            self.stats.connections, self.stats.failures, self.stats.dropped_messages
        );
        self.stats
    }

    /// Map one connection attempt's outcome to the event reported downstream.
    /// Silent streams count as closes rather than failures. `None` means the
    /// event queue is gone.
    fn lifecycle_event(&mut self, outcome: Result<()>) -> Option<ConnectionEvent> {
        match outcome {
            Err(AdapterError::ChannelClosed) => None,
            Err(AdapterError::ConnectionClosed { reason }) => Some(ConnectionEvent::Close { reason }),
            Err(e @ AdapterError::IdleTimeout { .. }) => Some(ConnectionEvent::Close {
                reason: Some(e.to_string()),
            }),
            Err(e) => {
                self.stats.failures += 1;
                Some(ConnectionEvent::Error {
                    message: e.to_string(),
                })
            }
            Ok(()) => Some(ConnectionEvent::Close { reason: None }),
        }
    }

    /// Connect, then forward messages until the stream ends or fails
    async fn connect_and_stream(&mut self, url: &str) -> Result<()> {
        self.state = ConnectionState::Connecting;
        info!("🌐 Connecting to {}", url);

        let (ws_stream, response) = match timeout(self.config.connect_timeout, connect_async(url)).await {
            Ok(Ok(connected)) => connected,
            Ok(Err(e)) => {
                return Err(AdapterError::ConnectionFailed {
                    endpoint: url.to_string(),
                    reason: e.to_string(),
                })
            }
            Err(_) => {
                return Err(AdapterError::ConnectionTimeout {
                    endpoint: url.to_string(),
                    timeout_ms: self.config.connect_timeout.as_millis() as u64,
                })
            }
        };

        info!("✅ Connected with response: {:?}", response.status());
        self.state = ConnectionState::Connected;
        self.stats.connections += 1;
        self.backoff.reset();
        self.emit(FeedEvent::Connection(ConnectionEvent::Open)).await?;

        let (_ws_sender, mut ws_receiver) = ws_stream.split();

        loop {
            let next = match timeout(self.config.idle_timeout, ws_receiver.next()).await {
                Ok(next) => next,
                Err(_) => {
                    return Err(AdapterError::IdleTimeout {
                        timeout_ms: self.config.idle_timeout.as_millis() as u64,
                    })
                }
            };

            match next {
                Some(Ok(Message::Text(text))) => self.forward(&text).await?,
                Some(Ok(Message::Ping(_))) => {
                    debug!("Received ping, pong handled by tungstenite");
                }
                Some(Ok(Message::Close(frame))) => {
                    return Err(AdapterError::ConnectionClosed {
                        reason: frame.map(|f| f.reason.to_string()),
                    })
                }
                Some(Ok(_)) => {}
                Some(Err(e)) => return Err(AdapterError::WebSocket(e)),
                None => {
                    return Err(AdapterError::ConnectionClosed {
                        reason: Some("stream ended".to_string()),
                    })
                }
            }
        }
    }

    /// Parse one frame and queue its events; malformed frames are dropped
    async fn forward(&mut self, text: &str) -> Result<()> {
        match parse_stream_message(text) {
            Ok(events) => {
                for event in events {
                    self.emit(event).await?;
                }
            }
            Err(e) => {
                self.stats.dropped_messages += 1;
                debug!("Dropping feed message: {}", e);
            }
        }
        Ok(())
    }

    async fn emit(&self, event: FeedEvent) -> Result<()> {
        self.sender
            .send(event)
            .await
            .map_err(|_| AdapterError::ChannelClosed)
    }
}
