//! # Exponential Backoff
//!
//! Provides the retry pacing for recoverable watch stream disruptions.
//! The interval starts small so a blip reconnects quickly, doubles on every
//! consecutive failure, and is capped so a long outage never pushes a retry
//! past a useful cadence. The sequence with the default 1s/30s bounds:
//! 1s, 2s, 4s, 8s, 16s, 30s (max).
//!
//! The overall run deadline bounds the retries; a backoff sleep is always
//! raced against it and never outlives it.

use std::time::Duration;

/// Exponential backoff calculator.
///
/// Doubles the interval on each call up to a fixed cap. A healthy event
/// resets the sequence to the initial interval.
#[derive(Debug, Clone)]
pub struct ExponentialBackoff {
    /// Initial interval (for reset)
    initial: Duration,
    /// Interval the next failure will wait
    current: Duration,
    /// Upper bound on the interval
    max: Duration,
}

impl ExponentialBackoff {
    /// Create a new backoff with the given initial interval and cap.
    #[must_use]
    pub fn new(initial: Duration, max: Duration) -> Self {
        Self {
            initial,
            current: initial,
            max,
        }
    }

    /// Get the next backoff duration and advance the sequence.
    ///
    /// The sequence is capped at `max`.
    pub fn next_backoff(&mut self) -> Duration {
        let result = self.current;
        self.current = std::cmp::min(self.current.saturating_mul(2), self.max);
        result
    }

    /// Reset the backoff to the initial interval after a healthy event.
    pub fn reset(&mut self) {
        self.current = self.initial;
    }
}
