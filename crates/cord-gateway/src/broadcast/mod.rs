//! Event broadcasting
//!
//! Distributes client events to public subscribers.

mod emitter;

pub(crate) use emitter::panic_message;
pub use emitter::{EventEmitter, Listener, ListenerError, ListenerFailure, ListenerId};
