//! Quiet-period debouncing as an explicit state machine.
//!
//! Time is passed in by the caller, so the same logic serves a tokio timer
//! or a test that steps a clock by hand.

use std::time::{Duration, Instant};

/// Default quiet period before typed search text is applied.
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(500);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DebounceState<T> {
    Idle,
    Pending { deadline: Instant, value: T },
}

#[derive(Debug, Clone)]
pub struct Debouncer<T> {
    delay: Duration,
    state: DebounceState<T>,
}

impl<T> Debouncer<T> {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            state: DebounceState::Idle,
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    pub fn state(&self) -> &DebounceState<T> {
        &self.state
    }

    /// Arm (or re-arm) the timer with `value`. A pending value is replaced
    /// and its deadline pushed back. Returns the new deadline.
    pub fn trigger(&mut self, value: T, now: Instant) -> Instant {
        let deadline = now + self.delay;
        self.state = DebounceState::Pending { deadline, value };
        deadline
    }

    /// Drop any pending value without firing it.
    pub fn cancel(&mut self) -> Option<T> {
        match std::mem::replace(&mut self.state, DebounceState::Idle) {
            DebounceState::Idle => None,
            DebounceState::Pending { value, .. } => Some(value),
        }
    }

    /// Fire the pending value once its deadline has passed.
    pub fn poll(&mut self, now: Instant) -> Option<T> {
        match &self.state {
            DebounceState::Pending { deadline, .. } if *deadline <= now => self.cancel(),
            _ => None,
        }
    }

    pub fn is_pending(&self) -> bool {
        matches!(self.state, DebounceState::Pending { .. })
    }

    pub fn deadline(&self) -> Option<Instant> {
        match &self.state {
            DebounceState::Idle => None,
            DebounceState::Pending { deadline, .. } => Some(*deadline),
        }
    }
}

impl<T> Default for Debouncer<T> {
    fn default() -> Self {
        Self::new(DEFAULT_DEBOUNCE)
    }
}
