//! # cord-gateway
//!
//! Sharded gateway client: opens one WebSocket per shard, keeps each alive
//! with heartbeats, identifies through a throttled queue, mirrors guild and
//! channel state from dispatch events, and publishes everything it sees to
//! name-keyed subscribers.

pub mod broadcast;
mod client;
pub mod connection;
mod error;
pub mod events;
pub mod handlers;
pub mod mirror;
pub mod protocol;
pub mod rest;
pub mod scheduler;
pub mod throttle;
pub mod transport;

pub use broadcast::{ListenerError, ListenerId};
pub use client::GatewayClient;
pub use connection::ShardCommand;
pub use error::{ClientError, ClientResult};
pub use events::{names, ClientEvent};
