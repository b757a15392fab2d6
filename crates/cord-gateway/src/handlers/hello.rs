//! Hello (op 10)

use super::{HandlerError, HandlerResult, IdentifyHandler};
use crate::client::state::SessionState;
use crate::connection::HeartbeatScheduler;
use crate::protocol::{GatewayMessage, HelloPayload};
use std::time::Duration;

/// Starts heartbeating and identifies
pub struct HelloHandler;

impl HelloHandler {
    pub(crate) fn handle(
        state: &mut SessionState,
        shard: u32,
        message: &GatewayMessage,
    ) -> HandlerResult<()> {
        let hello: HelloPayload = serde_json::from_value(message.d.clone())
            .map_err(|e| HandlerError::InvalidPayload(format!("Hello: {e}")))?;

        let entry = state
            .shards
            .get_mut(&shard)
            .ok_or(HandlerError::UnknownShard(shard))?;
        entry.set_heartbeat_interval(Duration::from_millis(hello.heartbeat_interval));

        tracing::debug!(shard, interval_ms = hello.heartbeat_interval, "Gateway said hello");
        state.debug(format!("Got Hello on shard {shard}"), Some(message.d.clone()));

        HeartbeatScheduler::schedule(state, shard);
        IdentifyHandler::enqueue(state, shard)
    }
}
