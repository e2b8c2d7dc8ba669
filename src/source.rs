//! Real-clock seam.
//!
//! The mock clock needs a reading of *real* monotonic time in `Running` mode.
//! [`TimeSource`] abstracts over that reading so tests can drive it manually
//! via [`ManualClock`] while production harnesses use [`MonotonicClock`].

use crate::types::Time;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

#[inline]
fn duration_to_nanos_saturating(duration: Duration) -> u64 {
    duration.as_nanos().min(u128::from(u64::MAX)) as u64
}

/// Source of real monotonic time readings.
pub trait TimeSource: Send + Sync {
    /// Returns the current real monotonic time.
    fn now(&self) -> Time;
}

/// Monotonic time source backed by `std::time::Instant`.
///
/// The epoch is the moment this source was created.
#[derive(Debug)]
pub struct MonotonicClock {
    epoch: std::time::Instant,
}

impl MonotonicClock {
    /// Creates a monotonic time source with its epoch at "now".
    #[must_use]
    pub fn new() -> Self {
        Self {
            epoch: std::time::Instant::now(),
        }
    }
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl TimeSource for MonotonicClock {
    fn now(&self) -> Time {
        Time::from_nanos(duration_to_nanos_saturating(self.epoch.elapsed()))
    }
}

/// Manually advanced time source for tests.
///
/// Time only moves when the test says so, which makes `Running`-mode behavior
/// of the mock clock fully deterministic.
///
/// # Example
///
/// ```
/// use mockclock::{ManualClock, Time, TimeSource};
///
/// let clock = ManualClock::new();
/// assert_eq!(clock.now(), Time::ZERO);
///
/// clock.advance(1_000_000_000); // 1 second
/// assert_eq!(clock.now(), Time::from_secs(1));
/// ```
#[derive(Debug)]
pub struct ManualClock {
    now: AtomicU64,
}

impl ManualClock {
    /// Creates a manual clock starting at time zero.
    #[must_use]
    pub fn new() -> Self {
        Self {
            now: AtomicU64::new(0),
        }
    }

    /// Creates a manual clock starting at the given time.
    #[must_use]
    pub fn starting_at(time: Time) -> Self {
        Self {
            now: AtomicU64::new(time.as_nanos()),
        }
    }

    /// Advances time by the given number of nanoseconds.
    pub fn advance(&self, nanos: u64) {
        self.now.fetch_add(nanos, Ordering::Release);
    }

    /// Advances time to the given absolute time.
    ///
    /// If the target is in the past this is a no-op.
    pub fn advance_to(&self, time: Time) {
        let target = time.as_nanos();
        let mut current = self.now.load(Ordering::Acquire);
        while current < target {
            match self.now.compare_exchange_weak(
                current,
                target,
                Ordering::Release,
                Ordering::Relaxed,
            ) {
                Ok(_) => break,
                Err(actual) => current = actual,
            }
        }
    }

    /// Sets the current time.
    pub fn set(&self, time: Time) {
        self.now.store(time.as_nanos(), Ordering::Release);
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl TimeSource for ManualClock {
    fn now(&self) -> Time {
        Time::from_nanos(self.now.load(Ordering::Acquire))
    }
}
