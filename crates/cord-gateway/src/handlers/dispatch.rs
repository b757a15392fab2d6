//! Dispatch (op 0)
//!
//! Records the sequence, folds the event into the state mirror, and announces
//! what changed. The event is always published as `event.<NAME>`, even when
//! the mirror could not decode it.

use super::{HandlerError, HandlerResult};
use crate::client::state::SessionState;
use crate::events::ClientEvent;
use crate::mirror::MirrorUpdate;
use crate::protocol::GatewayMessage;
use tokio::time::Instant;

/// Handles Dispatch frames
pub struct DispatchHandler;

impl DispatchHandler {
    pub(crate) fn handle(
        state: &mut SessionState,
        shard: u32,
        message: &GatewayMessage,
    ) -> HandlerResult<()> {
        let entry = state
            .shards
            .get_mut(&shard)
            .ok_or(HandlerError::UnknownShard(shard))?;
        entry.record_sequence(message.s);

        let Some(event) = message.t.clone() else {
            return Err(HandlerError::InvalidPayload(
                "Dispatch without an event name".to_string(),
            ));
        };

        let result = match state.mirror.apply(shard, &event, &message.d, Instant::now()) {
            Ok(update) => {
                Self::announce(state, shard, update, message);
                Ok(())
            }
            Err(e) => Err(HandlerError::InvalidPayload(format!("{event}: {e}"))),
        };

        state.emit(ClientEvent::Dispatch {
            shard,
            event,
            data: message.d.clone(),
        });
        result
    }

    fn announce(state: &mut SessionState, shard: u32, update: MirrorUpdate, message: &GatewayMessage) {
        match update {
            MirrorUpdate::ShardReady => {
                if let Some(entry) = state.shards.get_mut(&shard) {
                    entry.set_ready();
                }
                tracing::info!(shard, "Shard ready");
                state.debug(format!("Shard is ready: {shard}"), None);
            }
            MirrorUpdate::GuildAdded {
                guild_id,
                name,
                channels,
            } => {
                state.message(format!("Found new server on shard {shard}: {name} ({guild_id})"), None);
                for channel in channels {
                    state.message(format!("\tChannel: {} ({})", channel.name, channel.id), None);
                }
            }
            MirrorUpdate::GuildRemoved { guild_id, name } => {
                state.message(format!("Removed server on shard {shard}: {name} ({guild_id})"), None);
            }
            MirrorUpdate::ChannelAdded {
                guild_id,
                guild_name,
                channel,
            } => {
                state.message(
                    format!(
                        "Found new channel for server {guild_name} ({guild_id}) on shard {shard}: {} ({})",
                        channel.name, channel.id
                    ),
                    None,
                );
            }
            MirrorUpdate::ChannelRemoved {
                guild_id,
                guild_name,
                channel_id,
                name,
            } => {
                state.message(
                    format!(
                        "Removed channel for server {guild_name} ({guild_id}) on shard {shard}: {name} ({channel_id})"
                    ),
                    None,
                );
            }
            MirrorUpdate::DmChannelAdded { person, channel_id } => {
                state.message(
                    format!(
                        "Found new channel for person {} ({}) on shard {shard}: {channel_id}",
                        person.tag(),
                        person.id
                    ),
                    None,
                );
            }
            MirrorUpdate::DmChannelRemoved { person, channel_id } => {
                state.message(
                    format!(
                        "Removed channel for person {} ({}) on shard {shard}: {channel_id}",
                        person.tag(),
                        person.id
                    ),
                    None,
                );
            }
            MirrorUpdate::UntrackedChannel { created, data } => {
                let text = if created {
                    format!("Found new channel on shard {shard}")
                } else {
                    format!("Removed channel on shard {shard}")
                };
                state.message(text, Some(data));
            }
            MirrorUpdate::Unchanged => {}
            MirrorUpdate::Unrecognized => {
                state.debug(
                    format!("Got Unknown Event on shard {shard}"),
                    serde_json::to_value(message).ok(),
                );
            }
        }
    }
}
