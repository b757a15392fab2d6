//! Local mirror of gateway state

mod models;
mod state_mirror;

pub use models::{Channel, DmChannelBinding, Guild};
pub use state_mirror::{MirrorUpdate, StateMirror};
