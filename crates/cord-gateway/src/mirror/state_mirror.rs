//! State mirror
//!
//! Guilds, their text channels, and direct message channels, built only from
//! dispatched events. It reflects what the gateway has said since the last
//! connect and nothing more.

use super::models::{Channel, DmChannelBinding, Guild};
use crate::events::{
    ChannelEvent, GatewayEventType, GuildCreateEvent, GuildDeleteEvent, UserPayload,
};
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::time::Duration;
use tokio::time::Instant;

/// What applying one dispatch event changed
#[derive(Debug, Clone, PartialEq)]
pub enum MirrorUpdate {
    /// READY: the shard finished its handshake
    ShardReady,
    GuildAdded {
        guild_id: String,
        name: String,
        channels: Vec<Channel>,
    },
    GuildRemoved {
        guild_id: String,
        name: String,
    },
    ChannelAdded {
        guild_id: String,
        guild_name: String,
        channel: Channel,
    },
    ChannelRemoved {
        guild_id: String,
        guild_name: String,
        channel_id: String,
        name: String,
    },
    DmChannelAdded {
        person: UserPayload,
        channel_id: String,
    },
    DmChannelRemoved {
        person: UserPayload,
        channel_id: String,
    },
    /// A channel event for a channel the mirror does not track
    UntrackedChannel { created: bool, data: Value },
    /// Recognised event with no effect on the mirror
    Unchanged,
    /// Event name this client does not know
    Unrecognized,
}

#[derive(Debug, Default)]
pub struct StateMirror {
    guilds: HashMap<String, Guild>,
    dm_channels: HashMap<String, DmChannelBinding>,
}

impl StateMirror {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply a dispatch event received on `shard`
    pub fn apply(
        &mut self,
        shard: u32,
        event: &str,
        data: &Value,
        now: Instant,
    ) -> Result<MirrorUpdate, serde_json::Error> {
        let Some(kind) = GatewayEventType::from_str(event) else {
            return Ok(MirrorUpdate::Unrecognized);
        };

        match kind {
            GatewayEventType::Ready => Ok(MirrorUpdate::ShardReady),
            GatewayEventType::GuildCreate => {
                let guild: GuildCreateEvent = serde_json::from_value(data.clone())?;
                Ok(self.guild_create(shard, guild))
            }
            GatewayEventType::GuildDelete => {
                let guild: GuildDeleteEvent = serde_json::from_value(data.clone())?;
                Ok(self.guild_delete(&guild.id))
            }
            GatewayEventType::ChannelCreate => {
                let channel: ChannelEvent = serde_json::from_value(data.clone())?;
                Ok(self.channel_create(channel, data, now))
            }
            GatewayEventType::ChannelDelete => {
                let channel: ChannelEvent = serde_json::from_value(data.clone())?;
                Ok(self.channel_delete(channel, data))
            }
            _ => Ok(MirrorUpdate::Unchanged),
        }
    }

    fn guild_create(&mut self, shard: u32, event: GuildCreateEvent) -> MirrorUpdate {
        let channels: BTreeMap<String, Channel> = event
            .channels
            .into_iter()
            .filter(ChannelEvent::is_guild_text)
            .map(|c| {
                let channel = Channel {
                    id: c.id,
                    name: c.name.unwrap_or_default(),
                };
                (channel.id.clone(), channel)
            })
            .collect();

        let update = MirrorUpdate::GuildAdded {
            guild_id: event.id.clone(),
            name: event.name.clone(),
            channels: channels.values().cloned().collect(),
        };

        self.guilds.insert(
            event.id.clone(),
            Guild {
                id: event.id,
                name: event.name,
                shard,
                channels,
            },
        );
        update
    }

    fn guild_delete(&mut self, guild_id: &str) -> MirrorUpdate {
        match self.guilds.remove(guild_id) {
            Some(guild) => MirrorUpdate::GuildRemoved {
                guild_id: guild.id,
                name: guild.name,
            },
            None => MirrorUpdate::Unchanged,
        }
    }

    fn channel_create(&mut self, event: ChannelEvent, data: &Value, now: Instant) -> MirrorUpdate {
        if event.is_guild_text() {
            if let Some(guild) = event.guild_id.as_ref().and_then(|id| self.guilds.get_mut(id)) {
                if guild.channels.contains_key(&event.id) {
                    return MirrorUpdate::Unchanged;
                }
                let channel = Channel {
                    id: event.id.clone(),
                    name: event.name.unwrap_or_default(),
                };
                guild.channels.insert(event.id, channel.clone());
                return MirrorUpdate::ChannelAdded {
                    guild_id: guild.id.clone(),
                    guild_name: guild.name.clone(),
                    channel,
                };
            }
        } else if event.is_dm() {
            if let Some(person) = event.recipient() {
                if self.dm_channels.contains_key(&person.id) {
                    return MirrorUpdate::Unchanged;
                }
                self.dm_channels.insert(
                    person.id.clone(),
                    DmChannelBinding {
                        person_id: person.id.clone(),
                        channel_id: event.id.clone(),
                        last_used: now,
                    },
                );
                return MirrorUpdate::DmChannelAdded {
                    person: person.clone(),
                    channel_id: event.id,
                };
            }
        }

        MirrorUpdate::UntrackedChannel {
            created: true,
            data: data.clone(),
        }
    }

    fn channel_delete(&mut self, event: ChannelEvent, data: &Value) -> MirrorUpdate {
        if event.is_guild_text() {
            if let Some(guild) = event.guild_id.as_ref().and_then(|id| self.guilds.get_mut(id)) {
                guild.channels.remove(&event.id);
                return MirrorUpdate::ChannelRemoved {
                    guild_id: guild.id.clone(),
                    guild_name: guild.name.clone(),
                    channel_id: event.id,
                    name: event.name.unwrap_or_default(),
                };
            }
        } else if event.is_dm() {
            if let Some(person) = event.recipient() {
                self.dm_channels.remove(&person.id);
                return MirrorUpdate::DmChannelRemoved {
                    person: person.clone(),
                    channel_id: event.id,
                };
            }
        }

        MirrorUpdate::UntrackedChannel {
            created: false,
            data: data.clone(),
        }
    }

    pub fn valid_server(&self, guild_id: &str) -> bool {
        self.guilds.contains_key(guild_id)
    }

    pub fn valid_channel(&self, guild_id: &str, channel_id: &str) -> bool {
        self.guilds
            .get(guild_id)
            .is_some_and(|g| g.channels.contains_key(channel_id))
    }

    pub fn guild(&self, guild_id: &str) -> Option<&Guild> {
        self.guilds.get(guild_id)
    }

    pub fn guild_count(&self) -> usize {
        self.guilds.len()
    }

    /// Channel id of the DM binding for `person_id`
    pub fn dm_channel(&self, person_id: &str) -> Option<&str> {
        self.dm_channels
            .get(person_id)
            .map(|b| b.channel_id.as_str())
    }

    /// Refresh a binding's `last_used`, returning its channel id
    pub fn touch_dm_channel(&mut self, person_id: &str, now: Instant) -> Option<String> {
        let binding = self.dm_channels.get_mut(person_id)?;
        binding.last_used = now;
        Some(binding.channel_id.clone())
    }

    /// Record a channel opened for `person_id`, or refresh the existing one
    pub fn bind_dm_channel(&mut self, person_id: &str, channel_id: &str, now: Instant) {
        self.dm_channels
            .entry(person_id.to_string())
            .and_modify(|b| {
                b.channel_id = channel_id.to_string();
                b.last_used = now;
            })
            .or_insert_with(|| DmChannelBinding {
                person_id: person_id.to_string(),
                channel_id: channel_id.to_string(),
                last_used: now,
            });
    }

    /// Remove and return every binding idle for longer than `ttl`
    pub fn take_expired_dm_channels(&mut self, now: Instant, ttl: Duration) -> Vec<DmChannelBinding> {
        let expired: Vec<String> = self
            .dm_channels
            .values()
            .filter(|b| b.is_expired(now, ttl))
            .map(|b| b.person_id.clone())
            .collect();

        expired
            .iter()
            .filter_map(|person| self.dm_channels.remove(person))
            .collect()
    }

    pub fn clear(&mut self) {
        self.guilds.clear();
        self.dm_channels.clear();
    }
}
