//! Per-shard heartbeat timer
//!
//! Each schedule issues a fresh fence, so a timer left over from an earlier
//! connection or interval finds its fence stale and does nothing.

use super::session::ShardSession;
use super::shard::HeartbeatDue;
use crate::client::commands::Command;
use crate::client::state::SessionState;
use crate::protocol::GatewayMessage;
use crate::scheduler::FenceToken;

pub(crate) struct HeartbeatScheduler;

impl HeartbeatScheduler {
    /// Arm the next heartbeat for `shard` one interval from now
    pub(crate) fn schedule(state: &mut SessionState, shard: u32) {
        let fence = state.fences.issue();
        let Some(delay) = state
            .shards
            .get_mut(&shard)
            .and_then(|entry| entry.arm_heartbeat(fence))
        else {
            return;
        };
        tracing::trace!(shard, delay_ms = delay.as_millis() as u64, "Heartbeat scheduled");
        state.timers.once(delay, Command::HeartbeatTick { shard, fence });
    }

    /// A heartbeat timer fired
    pub(crate) fn fire(state: &mut SessionState, shard: u32, fence: FenceToken) {
        let due = match state.shards.get_mut(&shard) {
            Some(entry) => entry.heartbeat_due(fence),
            None => HeartbeatDue::Stale,
        };

        match due {
            HeartbeatDue::Stale => {}
            HeartbeatDue::Dead => {
                tracing::warn!(shard, "Heartbeat not acknowledged, closing shard");
                state.debug(format!("Shard connection appears to be dead: {shard}"), None);
                let Some(entry) = state.shards.get(&shard) else {
                    return;
                };
                if let Err(e) = entry.close() {
                    // The transport never hears the close; drop it here instead
                    tracing::warn!(shard, error = %e, "Close on dead shard failed, dropping connection");
                    if let Some(connection) = entry.connection_fence() {
                        ShardSession::closed(
                            state,
                            shard,
                            connection,
                            None,
                            format!("heartbeat timeout ({e})"),
                        );
                    }
                }
            }
            HeartbeatDue::Beat { sequence } => {
                state.debug(format!("Sending heartbeat for shard: {shard}"), None);
                let sent = GatewayMessage::heartbeat(sequence)
                    .to_json()
                    .map_err(|e| e.to_string())
                    .and_then(|text| match state.shards.get(&shard) {
                        Some(entry) => entry.send(text).map_err(|e| e.to_string()),
                        None => Err("shard missing".to_string()),
                    });
                if let Err(e) = sent {
                    tracing::warn!(shard, error = %e, "Failed to send heartbeat");
                }
                Self::schedule(state, shard);
            }
        }
    }
}
