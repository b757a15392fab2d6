//! Timer scheduling with fence tokens

mod fence;
mod timers;

pub use fence::{is_current, FenceGenerator, FenceToken};
pub use timers::Timers;
