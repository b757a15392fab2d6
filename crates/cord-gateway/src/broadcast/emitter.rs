//! Public event emitter
//!
//! Subscribers register by event name and receive the owning context (the
//! client) plus the event. Emitting never fails: listener errors and panics are
//! collected and returned to the caller, which routes them to `client.error`.

use crate::events::ClientEvent;
use dashmap::DashMap;
use std::any::Any;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use thiserror::Error;

/// Handle returned by [`EventEmitter::on`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

/// Error a listener returns to report a failure
#[derive(Debug, Clone, Error)]
#[error("{0}")]
pub struct ListenerError(String);

impl ListenerError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

impl From<String> for ListenerError {
    fn from(message: String) -> Self {
        Self(message)
    }
}

impl From<&str> for ListenerError {
    fn from(message: &str) -> Self {
        Self(message.to_string())
    }
}

/// Subscriber callback
pub type Listener<C> = Arc<dyn Fn(&C, &ClientEvent) -> Result<(), ListenerError> + Send + Sync>;

/// A listener that returned an error or panicked
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListenerFailure {
    pub listener: ListenerId,
    pub message: String,
}

/// Name-keyed listener registry
pub struct EventEmitter<C> {
    listeners: DashMap<String, Vec<(ListenerId, Listener<C>)>>,
    next_id: AtomicU64,
}

impl<C> Default for EventEmitter<C> {
    fn default() -> Self {
        Self {
            listeners: DashMap::new(),
            next_id: AtomicU64::new(1),
        }
    }
}

impl<C> fmt::Debug for EventEmitter<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventEmitter")
            .field("events", &self.listeners.len())
            .finish()
    }
}

impl<C> EventEmitter<C> {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `handler` for events named `event`
    pub fn on<F>(&self, event: impl Into<String>, handler: F) -> ListenerId
    where
        F: Fn(&C, &ClientEvent) -> Result<(), ListenerError> + Send + Sync + 'static,
    {
        let id = ListenerId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.listeners
            .entry(event.into())
            .or_default()
            .push((id, Arc::new(handler)));
        id
    }

    /// Remove one listener; returns whether it was registered
    pub fn remove_listener(&self, event: &str, id: ListenerId) -> bool {
        let mut removed = false;
        if let Some(mut listeners) = self.listeners.get_mut(event) {
            let before = listeners.len();
            listeners.retain(|(listener, _)| *listener != id);
            removed = listeners.len() != before;
        }
        self.listeners.retain(|_, listeners| !listeners.is_empty());
        removed
    }

    /// Remove every listener for `event`; returns how many were removed
    pub fn remove_all_listeners(&self, event: &str) -> usize {
        self.listeners
            .remove(event)
            .map_or(0, |(_, listeners)| listeners.len())
    }

    pub fn listener_count(&self, event: &str) -> usize {
        self.listeners.get(event).map_or(0, |l| l.len())
    }

    pub fn has_listeners(&self, event: &str) -> bool {
        self.listener_count(event) > 0
    }

    /// Call every listener registered for the event's name.
    ///
    /// Listeners are snapshotted first, so they may register or remove
    /// listeners while being called.
    pub fn emit(&self, context: &C, event: &ClientEvent) -> Vec<ListenerFailure> {
        let name = event.name();
        let snapshot: Vec<(ListenerId, Listener<C>)> = match self.listeners.get(name.as_ref()) {
            Some(listeners) => listeners.value().clone(),
            None => return Vec::new(),
        };

        let mut failures = Vec::new();
        for (id, listener) in snapshot {
            let outcome = panic::catch_unwind(AssertUnwindSafe(|| listener(context, event)));
            let message = match outcome {
                Ok(Ok(())) => continue,
                Ok(Err(e)) => e.to_string(),
                Err(payload) => format!("listener panicked: {}", panic_message(payload.as_ref())),
            };
            failures.push(ListenerFailure {
                listener: id,
                message,
            });
        }
        failures
    }
}

/// Best-effort text of a panic payload
pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
