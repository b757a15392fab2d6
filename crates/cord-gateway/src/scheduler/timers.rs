//! One-shot and periodic timers
//!
//! Timers never act on session state. When they fire they post a command to the
//! session actor, which re-validates any fence token the command carries.

use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};

/// Posts values to a channel after a delay or on a period
#[derive(Debug)]
pub struct Timers<C> {
    tx: mpsc::UnboundedSender<C>,
}

impl<C> Clone for Timers<C> {
    fn clone(&self) -> Self {
        Self {
            tx: self.tx.clone(),
        }
    }
}

impl<C: Send + 'static> Timers<C> {
    #[must_use]
    pub fn new(tx: mpsc::UnboundedSender<C>) -> Self {
        Self { tx }
    }

    /// Post `command` once after `delay`
    pub fn once(&self, delay: Duration, command: C) -> JoinHandle<()> {
        let tx = self.tx.clone();
        tokio::spawn(async move {
            time::sleep(delay).await;
            let _ = tx.send(command);
        })
    }

    /// Post `factory()` every `period`, first after one full period.
    ///
    /// Stops once the receiving side is gone.
    pub fn every<F>(&self, period: Duration, factory: F) -> JoinHandle<()>
    where
        F: Fn() -> C + Send + 'static,
    {
        let tx = self.tx.clone();
        tokio::spawn(async move {
            let mut ticker = time::interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                if tx.send(factory()).is_err() {
                    break;
                }
            }
        })
    }
}
