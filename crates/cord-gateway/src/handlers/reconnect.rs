//! Reconnect (op 7) and Invalid Session (op 9)
//!
//! Both are answered by identifying again on the existing connection.

use super::{HandlerResult, IdentifyHandler};
use crate::client::state::SessionState;
use crate::protocol::GatewayMessage;

pub struct ReconnectHandler;

impl ReconnectHandler {
    pub(crate) fn handle(
        state: &mut SessionState,
        shard: u32,
        message: &GatewayMessage,
    ) -> HandlerResult<()> {
        tracing::info!(shard, op = message.op, "Gateway asked shard to identify again");
        state.debug(
            format!("Shard {shard} asked to identify again (op {})", message.op),
            Some(message.d.clone()),
        );
        IdentifyHandler::enqueue(state, shard)
    }
}
