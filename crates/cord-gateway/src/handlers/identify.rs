//! Identify (op 2)
//!
//! Identify is never sent directly. It goes through the throttle queue so
//! shards identify at most once per drain period.

use super::HandlerResult;
use crate::client::state::SessionState;
use crate::connection::ShardCommand;
use crate::protocol::{IdentifyPayload, IdentifyProperties, OpCode};

/// Builds and queues Identify commands
pub struct IdentifyHandler;

impl IdentifyHandler {
    /// Queue an Identify for `shard`
    pub(crate) fn enqueue(state: &mut SessionState, shard: u32) -> HandlerResult<()> {
        let payload = Self::payload(state, shard);

        state.message(
            format!("Scheduling identify for shard {shard}"),
            Some(serde_json::to_value(payload.redacted())?),
        );
        tracing::debug!(shard, sharded = payload.shard.is_some(), "Identify queued");

        let command = ShardCommand::new(shard, OpCode::Identify, serde_json::to_value(&payload)?);
        state.throttle.push_command(command);
        Ok(())
    }

    fn payload(state: &SessionState, shard: u32) -> IdentifyPayload {
        // Only the bot gateway endpoint reports a shard count
        let total = state
            .gateway
            .as_ref()
            .and_then(|gateway| gateway.recommended_shard_count)
            .filter(|_| state.config.is_bot);

        IdentifyPayload {
            token: state.config.token.clone(),
            properties: IdentifyProperties::default(),
            compress: false,
            shard: total.map(|total| [shard, total]),
        }
    }
}
