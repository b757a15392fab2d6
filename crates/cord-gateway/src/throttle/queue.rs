//! Outbound throttle queue
//!
//! One FIFO shared by every shard. The session drains a single entry per tick,
//! which bounds how often identify commands leave the client regardless of
//! shard count.

use crate::connection::ShardCommand;
use std::collections::VecDeque;
use std::fmt;

/// Deferred action run when its turn comes
pub type DeferredAction = Box<dyn FnOnce() + Send + 'static>;

/// Queued item
pub enum ThrottleEntry {
    Command(ShardCommand),
    Deferred(DeferredAction),
}

impl fmt::Debug for ThrottleEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Command(command) => f.debug_tuple("Command").field(command).finish(),
            Self::Deferred(_) => f.write_str("Deferred(..)"),
        }
    }
}

#[derive(Debug, Default)]
pub struct OutboundThrottleQueue {
    entries: VecDeque<ThrottleEntry>,
}

impl OutboundThrottleQueue {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_command(&mut self, command: ShardCommand) {
        self.entries.push_back(ThrottleEntry::Command(command));
    }

    pub fn push_deferred(&mut self, action: DeferredAction) {
        self.entries.push_back(ThrottleEntry::Deferred(action));
    }

    /// Take the entry for this tick
    pub fn pop(&mut self) -> Option<ThrottleEntry> {
        self.entries.pop_front()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
