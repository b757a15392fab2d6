//! Gateway message format
//!
//! Defines the envelope shared by every frame in both directions.

use super::OpCode;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Gateway message format
///
/// `op` is kept as the raw integer so frames with op codes this client does not
/// know still decode and can be reported.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GatewayMessage {
    /// Operation code
    pub op: u8,

    /// Event type (only for op=0 Dispatch)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub t: Option<String>,

    /// Sequence number (only for op=0 Dispatch)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub s: Option<u64>,

    /// Event data payload
    #[serde(default)]
    pub d: Value,
}

impl GatewayMessage {
    /// Build an outbound command.
    ///
    /// `sequence` and `event` are only carried for Dispatch frames.
    #[must_use]
    pub fn command(op: OpCode, payload: Value, sequence: Option<u64>, event: Option<String>) -> Self {
        let dispatch = op == OpCode::Dispatch;
        Self {
            op: op.as_u8(),
            t: if dispatch { event } else { None },
            s: if dispatch { sequence } else { None },
            d: payload,
        }
    }

    /// Create a Heartbeat message (op=1) carrying the last sequence seen
    #[must_use]
    pub fn heartbeat(last_sequence: Option<u64>) -> Self {
        Self::command(
            OpCode::Heartbeat,
            last_sequence.map_or(Value::Null, Value::from),
            None,
            None,
        )
    }

    /// Create a Dispatch message (op=0)
    #[must_use]
    pub fn dispatch(event_type: impl Into<String>, sequence: u64, data: Value) -> Self {
        Self::command(OpCode::Dispatch, data, Some(sequence), Some(event_type.into()))
    }

    /// The known op code of this frame, if any
    #[must_use]
    pub fn opcode(&self) -> Option<OpCode> {
        OpCode::from_u8(self.op)
    }

    /// Serialize to JSON string
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Deserialize from JSON string
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

impl std::fmt::Display for GatewayMessage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match (self.opcode(), &self.t) {
            (Some(op), Some(t)) => {
                write!(f, "GatewayMessage(op={op}, t={t}")?;
                if let Some(s) = self.s {
                    write!(f, ", s={s}")?;
                }
                write!(f, ")")
            }
            (Some(op), None) => write!(f, "GatewayMessage(op={op})"),
            (None, _) => write!(f, "GatewayMessage(op={} unknown)", self.op),
        }
    }
}
