//! Per-shard state
//!
//! A `Shard` is replaced wholesale whenever its connection is re-established;
//! nothing carries over from the previous connection.

use crate::protocol::OpCode;
use crate::scheduler::{is_current, FenceToken};
use crate::transport::{OutboundFrame, TransportError, NORMAL_CLOSURE};
use serde_json::Value;
use std::time::Duration;
use tokio::sync::mpsc;

/// A command addressed to one shard's connection
#[derive(Debug, Clone, PartialEq)]
pub struct ShardCommand {
    pub shard: u32,
    pub op: OpCode,
    pub payload: Value,
    /// Only sent for Dispatch
    pub sequence: Option<u64>,
    /// Only sent for Dispatch
    pub event: Option<String>,
}

impl ShardCommand {
    #[must_use]
    pub fn new(shard: u32, op: OpCode, payload: Value) -> Self {
        Self {
            shard,
            op,
            payload,
            sequence: None,
            event: None,
        }
    }
}

/// Outcome of a heartbeat timer firing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeartbeatDue {
    /// Timer was superseded; do nothing
    Stale,
    /// Previous heartbeat was never answered
    Dead,
    /// Send a heartbeat carrying this sequence
    Beat { sequence: Option<u64> },
}

#[derive(Debug)]
struct ShardConnection {
    fence: FenceToken,
    sender: mpsc::Sender<OutboundFrame>,
}

/// One shard of the session
#[derive(Debug)]
pub struct Shard {
    index: u32,
    connection: Option<ShardConnection>,
    sequence: Option<u64>,
    ready: bool,
    heartbeat_interval: Option<Duration>,
    heartbeat_fence: Option<FenceToken>,
    awaiting_ack: bool,
}

impl Shard {
    /// A freshly connected shard
    #[must_use]
    pub fn new(index: u32, connection: FenceToken, sender: mpsc::Sender<OutboundFrame>) -> Self {
        Self {
            index,
            connection: Some(ShardConnection {
                fence: connection,
                sender,
            }),
            sequence: None,
            ready: false,
            heartbeat_interval: None,
            heartbeat_fence: None,
            awaiting_ack: false,
        }
    }

    /// A shard slot whose first connection has not opened yet
    #[must_use]
    pub fn pending(index: u32) -> Self {
        Self {
            index,
            connection: None,
            sequence: None,
            ready: false,
            heartbeat_interval: None,
            heartbeat_fence: None,
            awaiting_ack: false,
        }
    }

    /// Fence of the live connection, if any
    pub fn connection_fence(&self) -> Option<FenceToken> {
        self.connection.as_ref().map(|c| c.fence)
    }

    pub fn index(&self) -> u32 {
        self.index
    }

    pub fn sequence(&self) -> Option<u64> {
        self.sequence
    }

    pub fn is_ready(&self) -> bool {
        self.ready
    }

    pub fn set_ready(&mut self) {
        self.ready = true;
    }

    pub fn awaiting_ack(&self) -> bool {
        self.awaiting_ack
    }

    pub fn heartbeat_interval(&self) -> Option<Duration> {
        self.heartbeat_interval
    }

    pub fn is_connected(&self) -> bool {
        self.connection.is_some()
    }

    /// Whether events tagged with `fence` belong to the live connection
    pub fn is_current_connection(&self, fence: FenceToken) -> bool {
        is_current(self.connection_fence(), fence)
    }

    /// Any inbound frame proves the connection is alive
    pub fn on_frame(&mut self) {
        self.awaiting_ack = false;
    }

    /// Record the `s` of a dispatch frame
    pub fn record_sequence(&mut self, sequence: Option<u64>) {
        if sequence.is_some() {
            self.sequence = sequence;
        }
    }

    pub fn set_heartbeat_interval(&mut self, interval: Duration) {
        self.heartbeat_interval = Some(interval);
    }

    /// Make `fence` the live heartbeat token.
    ///
    /// Returns the delay to schedule, or `None` before HELLO set an interval.
    pub fn arm_heartbeat(&mut self, fence: FenceToken) -> Option<Duration> {
        let interval = self.heartbeat_interval?;
        self.heartbeat_fence = Some(fence);
        Some(interval)
    }

    /// Evaluate a heartbeat timer that fired with `fence`
    pub fn heartbeat_due(&mut self, fence: FenceToken) -> HeartbeatDue {
        if !is_current(self.heartbeat_fence, fence) {
            return HeartbeatDue::Stale;
        }
        if self.awaiting_ack {
            self.heartbeat_fence = None;
            return HeartbeatDue::Dead;
        }
        self.awaiting_ack = true;
        HeartbeatDue::Beat {
            sequence: self.sequence,
        }
    }

    /// Queue a text frame on the connection
    pub fn send(&self, text: String) -> Result<(), TransportError> {
        let connection = self.connection.as_ref().ok_or(TransportError::Closed)?;
        connection.sender.try_send(OutboundFrame::Text(text))?;
        Ok(())
    }

    /// Ask the transport to close.
    ///
    /// The connection stays recorded until the transport reports the close.
    pub fn close(&self) -> Result<(), TransportError> {
        let connection = self.connection.as_ref().ok_or(TransportError::Closed)?;
        connection.sender.try_send(OutboundFrame::Close {
            code: NORMAL_CLOSURE,
            reason: String::new(),
        })?;
        Ok(())
    }

    /// The transport reported the connection closed
    pub fn mark_disconnected(&mut self) {
        self.connection = None;
        self.ready = false;
        self.heartbeat_fence = None;
        self.awaiting_ack = false;
    }
}
