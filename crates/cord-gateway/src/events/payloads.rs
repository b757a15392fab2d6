//! Event payload definitions
//!
//! Only the fields the state mirror reads are modelled; everything else is ignored.

use serde::{Deserialize, Serialize};

/// Channel type of a guild text channel
pub const CHANNEL_TYPE_GUILD_TEXT: u8 = 0;

/// Channel type of a direct message channel
pub const CHANNEL_TYPE_DM: u8 = 1;

// === User Payload ===

/// User data included in events and returned by `GET /users/@me`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserPayload {
    pub id: String,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub discriminator: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
    #[serde(default)]
    pub bot: bool,
}

impl UserPayload {
    /// `username#discriminator`
    #[must_use]
    pub fn tag(&self) -> String {
        format!("{}#{}", self.username, self.discriminator)
    }
}

// === Guild Events ===

/// GUILD_CREATE event payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GuildCreateEvent {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub channels: Vec<ChannelPayload>,
}

/// GUILD_DELETE event payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GuildDeleteEvent {
    pub id: String,
    /// If true, this is a temporary outage
    #[serde(default)]
    pub unavailable: bool,
}

// === Channel Events ===

/// Channel data included in GUILD_CREATE and the CHANNEL_* events
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChannelPayload {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: u8,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub guild_id: Option<String>,
    /// Participants of a direct message channel
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub recipients: Vec<UserPayload>,
}

impl ChannelPayload {
    /// Whether this is a guild text channel
    #[must_use]
    pub fn is_guild_text(&self) -> bool {
        self.kind == CHANNEL_TYPE_GUILD_TEXT
    }

    /// Whether this is a direct message channel
    #[must_use]
    pub fn is_dm(&self) -> bool {
        self.kind == CHANNEL_TYPE_DM
    }

    /// The remote participant of a direct message channel
    #[must_use]
    pub fn recipient(&self) -> Option<&UserPayload> {
        self.recipients.first()
    }
}

/// CHANNEL_CREATE / CHANNEL_DELETE event payload
pub type ChannelEvent = ChannelPayload;
