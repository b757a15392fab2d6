//! Shard transport
//!
//! A gateway connection is a pair of channels: outbound frames to the socket
//! and socket events back to the client. The client never touches the socket
//! itself, so tests can drive a shard through a [`TransportPeer`].

mod websocket;

pub use websocket::WsConnector;

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::mpsc;

/// Close code sent when the client closes a shard
pub const NORMAL_CLOSURE: u16 = 1000;

/// Frame written to the socket
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutboundFrame {
    Text(String),
    Close { code: u16, reason: String },
}

/// Something that happened on the socket
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportEvent {
    Text(String),
    /// Terminal; nothing follows a close
    Closed { code: Option<u16>, reason: String },
}

/// Client side of an open connection
#[derive(Debug)]
pub struct TransportConnection {
    pub sender: mpsc::Sender<OutboundFrame>,
    pub events: mpsc::Receiver<TransportEvent>,
}

/// Socket side of an open connection
#[derive(Debug)]
pub struct TransportPeer {
    pub outbound: mpsc::Receiver<OutboundFrame>,
    pub events: mpsc::Sender<TransportEvent>,
}

impl TransportConnection {
    /// Create a connected pair with the given channel capacity
    #[must_use]
    pub fn pair(buffer: usize) -> (Self, TransportPeer) {
        let (out_tx, out_rx) = mpsc::channel(buffer);
        let (event_tx, event_rx) = mpsc::channel(buffer);
        (
            Self {
                sender: out_tx,
                events: event_rx,
            },
            TransportPeer {
                outbound: out_rx,
                events: event_tx,
            },
        )
    }
}

/// Opens gateway connections
#[async_trait]
pub trait GatewayConnector: Send + Sync {
    async fn connect(&self, url: &str) -> Result<TransportConnection, TransportError>;
}

/// Transport errors
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("Failed to connect to {url}: {reason}")]
    Connect { url: String, reason: String },

    #[error("Connection is closed")]
    Closed,

    #[error("Outbound buffer is full")]
    Full,

    #[error("WebSocket error: {0}")]
    Socket(String),
}

impl<T> From<mpsc::error::TrySendError<T>> for TransportError {
    fn from(err: mpsc::error::TrySendError<T>) -> Self {
        match err {
            mpsc::error::TrySendError::Full(_) => Self::Full,
            mpsc::error::TrySendError::Closed(_) => Self::Closed,
        }
    }
}
