//! Cancellation and pacing for the controller's poll loops.
//!
//! [`StopSignal`] is shared with whoever may abort a movement; it records why
//! the movement was stopped. [`PollClock`] paces a single loop: it waits on the
//! signal before every sample and enforces the loop's sample budget.

use std::time::Duration;

use parking_lot::{Condvar, Mutex};

use crate::error::{Error, Result};

/// Stop request for a running movement, with an interruptible pause.
///
/// The first reason given wins; later stop requests are ignored.
pub struct StopSignal {
    reason: Mutex<Option<String>>,
    condvar: Condvar,
}

impl StopSignal {
    pub fn new() -> Self {
        Self {
            reason: Mutex::new(None),
            condvar: Condvar::new(),
        }
    }

    /// Stop without a specific reason
    pub fn trigger(&self) {
        self.stop("stop requested");
    }

    /// Stop with `reason`, waking every paused loop
    pub fn stop(&self, reason: impl Into<String>) {
        let mut current = self.reason.lock();
        if current.is_none() {
            *current = Some(reason.into());
        }
        self.condvar.notify_all();
    }

    pub fn is_triggered(&self) -> bool {
        self.reason.lock().is_some()
    }

    pub fn reason(&self) -> Option<String> {
        self.reason.lock().clone()
    }

    /// `Err(Cancelled)` once a stop has been requested
    pub fn check(&self) -> Result<()> {
        Self::cancelled(&self.reason.lock())
    }

    /// Sleep for `interval`, returning early with `Err(Cancelled)` on a stop.
    ///
    /// A zero interval only checks the signal.
    pub fn pause(&self, interval: Duration) -> Result<()> {
        let mut reason = self.reason.lock();
        if !interval.is_zero() && reason.is_none() {
            self.condvar
                .wait_while_for(&mut reason, |reason| reason.is_none(), interval);
        }
        Self::cancelled(&reason)
    }

    fn cancelled(reason: &Option<String>) -> Result<()> {
        match reason {
            Some(reason) => Err(Error::Cancelled(reason.clone())),
            None => Ok(()),
        }
    }
}

impl Default for StopSignal {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for StopSignal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StopSignal")
            .field("reason", &self.reason())
            .finish()
    }
}

/// Paces one control loop against a [`StopSignal`]
pub struct PollClock<'a> {
    stop: &'a StopSignal,
    interval: Duration,
    limit: Option<u32>,
    taken: u32,
}

impl<'a> PollClock<'a> {
    pub fn new(stop: &'a StopSignal, interval: Duration, limit: Option<u32>) -> Self {
        Self {
            stop,
            interval,
            limit,
            taken: 0,
        }
    }

    /// Claim the next sample: check the budget, then pause one interval.
    ///
    /// Returns the 1-based sample number. A cancelled pause does not count.
    pub fn tick(&mut self) -> Result<u32> {
        if let Some(limit) = self.limit
            && self.taken >= limit
        {
            return Err(Error::PollLimitExceeded { polls: self.taken });
        }
        self.stop.pause(self.interval)?;
        self.taken += 1;
        Ok(self.taken)
    }

    /// Samples claimed so far
    pub fn taken(&self) -> u32 {
        self.taken
    }
}
