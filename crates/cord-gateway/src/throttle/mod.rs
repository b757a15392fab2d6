//! Throttled outbound lane

mod queue;

pub use queue::{DeferredAction, OutboundThrottleQueue, ThrottleEntry};
