//! Client events
//!
//! Everything the client publishes to subscribers, keyed by event name.

use crate::protocol::GatewayMessage;
use serde_json::Value;
use std::borrow::Cow;

/// Event names subscribers can listen on
pub mod names {
    pub const SHARD_CONNECTED: &str = "shard.connected";
    pub const SHARD_CONNECT_ERROR: &str = "shard.connect.error";
    pub const SHARD_CLOSED: &str = "shard.closed";
    pub const MESSAGE: &str = "client.message";
    pub const DEBUG: &str = "client.debug";
    pub const ERROR: &str = "client.error";

    /// Name for frames with the given op code, e.g. `opcode.10`
    #[must_use]
    pub fn opcode(op: u8) -> String {
        format!("opcode.{op}")
    }

    /// Name for a dispatch event, e.g. `event.MESSAGE_CREATE`
    #[must_use]
    pub fn event(name: &str) -> String {
        format!("event.{name}")
    }
}

/// An event published by the client
#[derive(Debug, Clone, PartialEq)]
pub enum ClientEvent {
    /// A shard's transport connection opened
    ShardConnected { shard: u32 },
    /// A shard's connection attempt failed; a retry is scheduled
    ShardConnectError { shard: u32, error: String },
    /// A shard's transport connection closed
    ShardClosed {
        shard: u32,
        code: Option<u16>,
        reason: String,
    },
    /// Raw inbound frame
    Opcode {
        shard: u32,
        op: u8,
        message: GatewayMessage,
    },
    /// Dispatch event (op 0)
    Dispatch {
        shard: u32,
        event: String,
        data: Value,
    },
    /// Informational message
    Message { text: String, detail: Option<Value> },
    /// Diagnostic, only published when debug is enabled
    Debug { text: String, detail: Option<Value> },
    /// A handler or subscriber failed
    Error { origin: String, message: String },
}

impl ClientEvent {
    /// Name subscribers register under
    #[must_use]
    pub fn name(&self) -> Cow<'static, str> {
        match self {
            Self::ShardConnected { .. } => Cow::Borrowed(names::SHARD_CONNECTED),
            Self::ShardConnectError { .. } => Cow::Borrowed(names::SHARD_CONNECT_ERROR),
            Self::ShardClosed { .. } => Cow::Borrowed(names::SHARD_CLOSED),
            Self::Opcode { op, .. } => Cow::Owned(names::opcode(*op)),
            Self::Dispatch { event, .. } => Cow::Owned(names::event(event)),
            Self::Message { .. } => Cow::Borrowed(names::MESSAGE),
            Self::Debug { .. } => Cow::Borrowed(names::DEBUG),
            Self::Error { .. } => Cow::Borrowed(names::ERROR),
        }
    }

    /// Shard the event originated on, if any
    #[must_use]
    pub fn shard(&self) -> Option<u32> {
        match self {
            Self::ShardConnected { shard }
            | Self::ShardConnectError { shard, .. }
            | Self::ShardClosed { shard, .. }
            | Self::Opcode { shard, .. }
            | Self::Dispatch { shard, .. } => Some(*shard),
            Self::Message { .. } | Self::Debug { .. } | Self::Error { .. } => None,
        }
    }

    pub(crate) fn message(text: impl Into<String>, detail: Option<Value>) -> Self {
        Self::Message {
            text: text.into(),
            detail,
        }
    }

    pub(crate) fn debug(text: impl Into<String>, detail: Option<Value>) -> Self {
        Self::Debug {
            text: text.into(),
            detail,
        }
    }
}
