//! Op code handlers
//!
//! Internal reactions to frames received from the gateway. These run before
//! the frame is published to subscribers.

mod dispatch;
mod error;
mod heartbeat;
mod hello;
mod identify;
mod reconnect;

pub use dispatch::DispatchHandler;
pub use error::{HandlerError, HandlerResult};
pub use heartbeat::HeartbeatHandler;
pub use hello::HelloHandler;
pub use identify::IdentifyHandler;
pub use reconnect::ReconnectHandler;

use crate::client::state::SessionState;
use crate::protocol::{GatewayMessage, OpCode};

/// Route gateway frames to their handler
pub struct OpcodeDispatcher;

impl OpcodeDispatcher {
    /// Handle a frame received on `shard`
    pub(crate) fn dispatch(
        state: &mut SessionState,
        shard: u32,
        message: &GatewayMessage,
    ) -> HandlerResult<()> {
        match message.opcode() {
            Some(OpCode::Dispatch) => DispatchHandler::handle(state, shard, message),
            Some(OpCode::Hello) => HelloHandler::handle(state, shard, message),
            Some(OpCode::Reconnect | OpCode::InvalidSession) => {
                ReconnectHandler::handle(state, shard, message)
            }
            Some(OpCode::Heartbeat | OpCode::HeartbeatAck) => {
                HeartbeatHandler::handle(state, shard, message)
            }
            // Client-only ops and anything unassigned
            _ => {
                tracing::debug!(shard, op = message.op, "Unhandled op code");
                state.debug(
                    format!("Got Unknown Message on shard {shard}"),
                    serde_json::to_value(message).ok(),
                );
                Ok(())
            }
        }
    }
}
