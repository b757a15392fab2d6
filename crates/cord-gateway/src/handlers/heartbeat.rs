//! Heartbeat (op 1) and Heartbeat ACK (op 11)
//!
//! Receiving any frame already cleared the awaiting-ack flag, so both ops only
//! need to be noted.

use super::HandlerResult;
use crate::client::state::SessionState;
use crate::protocol::{GatewayMessage, OpCode};

/// Handles heartbeat traffic from the gateway
pub struct HeartbeatHandler;

impl HeartbeatHandler {
    pub(crate) fn handle(
        state: &mut SessionState,
        shard: u32,
        message: &GatewayMessage,
    ) -> HandlerResult<()> {
        let text = match message.opcode() {
            Some(OpCode::HeartbeatAck) => format!("Got HB Ack on shard {shard}"),
            _ => format!("Got HB on shard {shard}"),
        };
        tracing::trace!(shard, op = message.op, "Heartbeat traffic");
        state.debug(text, Some(message.d.clone()));
        Ok(())
    }
}
