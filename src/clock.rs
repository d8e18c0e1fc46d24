//! Wall clock abstraction
//!
//! Observation timestamps, segment names and job due times all read the
//! clock through [`Clock`] so tests can drive them without sleeping.

use std::cell::Cell;

use chrono::{DateTime, Local, TimeDelta};

/// Source of wall-clock time.
pub trait Clock {
    /// Return the current local time.
    fn now(&self) -> DateTime<Local>;
}

/// System clock backed by `Local::now`.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Local> {
        Local::now()
    }
}

/// Manually driven clock for deterministic tests.
///
/// ```rust
/// use chrono::TimeDelta;
/// use facewatch::clock::{Clock, ManualClock};
///
/// let clock = ManualClock::default();
/// let start = clock.now();
/// clock.advance(TimeDelta::seconds(90));
/// assert_eq!(clock.now() - start, TimeDelta::seconds(90));
/// ```
#[derive(Debug)]
pub struct ManualClock {
    now: Cell<DateTime<Local>>,
}

impl ManualClock {
    /// Create a clock frozen at `start`.
    #[must_use]
    pub const fn new(start: DateTime<Local>) -> Self {
        Self {
            now: Cell::new(start),
        }
    }

    /// Move the clock forward (or backward, for a negative delta).
    pub fn advance(&self, delta: TimeDelta) {
        self.now.set(self.now.get() + delta);
    }

    /// Jump to an absolute instant.
    pub fn set(&self, now: DateTime<Local>) {
        self.now.set(now);
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new(Local::now())
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Local> {
        self.now.get()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_manual_clock_is_frozen_until_advanced() {
        let clock = ManualClock::default();
        let t0 = clock.now();
        assert_eq!(clock.now(), t0);

        clock.advance(TimeDelta::milliseconds(250));
        assert_eq!(clock.now() - t0, TimeDelta::milliseconds(250));
    }

    #[test]
    fn test_manual_clock_set() {
        let clock = ManualClock::default();
        let target = clock.now() + TimeDelta::days(3);
        clock.set(target);
        assert_eq!(clock.now(), target);
    }

    #[test]
    fn test_system_clock_monotone_enough() {
        let clock = SystemClock;
        let a = clock.now();
        let b = clock.now();
        assert!(b >= a);
    }
}
