//! Mirrored entities

use std::collections::BTreeMap;
use tokio::time::Instant;

/// Guild text channel
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Channel {
    pub id: String,
    pub name: String,
}

/// Guild known from a GUILD_CREATE
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Guild {
    pub id: String,
    pub name: String,
    /// Shard the guild was announced on
    pub shard: u32,
    /// Text channels by id
    pub channels: BTreeMap<String, Channel>,
}

/// Direct message channel opened with a person
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DmChannelBinding {
    pub person_id: String,
    pub channel_id: String,
    pub last_used: Instant,
}

impl DmChannelBinding {
    /// Whether the binding has been idle for longer than `ttl` at `now`
    #[must_use]
    pub fn is_expired(&self, now: Instant, ttl: std::time::Duration) -> bool {
        now.saturating_duration_since(self.last_used) > ttl
    }
}
