//! Shard connections
//!
//! Per-shard state, the connect/close lifecycle, and heartbeats.

mod heartbeat;
mod session;
mod shard;

pub(crate) use heartbeat::HeartbeatScheduler;
pub(crate) use session::ShardSession;
pub use shard::{HeartbeatDue, Shard, ShardCommand};
