//! Gateway events
//!
//! Dispatch event names and payloads received from the gateway, and the events
//! the client republishes to its subscribers.

mod client_events;
mod event_types;
mod payloads;

pub use client_events::{names, ClientEvent};
pub use event_types::GatewayEventType;
pub use payloads::{
    ChannelEvent, ChannelPayload, GuildCreateEvent, GuildDeleteEvent, UserPayload,
    CHANNEL_TYPE_DM, CHANNEL_TYPE_GUILD_TEXT,
};
