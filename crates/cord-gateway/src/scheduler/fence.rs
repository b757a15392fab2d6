//! Fence tokens
//!
//! Every scheduled callback carries the token that was current when it was
//! scheduled. Rescheduling hands out a new token, so callbacks from an older
//! schedule compare unequal and do nothing.

use std::fmt;

/// Opaque generation token
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FenceToken(u64);

impl fmt::Display for FenceToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Hands out tokens that are never reused within one session
#[derive(Debug, Default)]
pub struct FenceGenerator {
    next: u64,
}

impl FenceGenerator {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Issue a fresh token
    pub fn issue(&mut self) -> FenceToken {
        self.next += 1;
        FenceToken(self.next)
    }
}

/// Whether `candidate` is still the live token in `slot`
#[must_use]
pub fn is_current(slot: Option<FenceToken>, candidate: FenceToken) -> bool {
    slot == Some(candidate)
}
