//! Freeze/run state machine for simulated time.
//!
//! [`ClockState`] owns only the time bookkeeping: the mode, the accumulated
//! simulated time, and the real-time reference captured when the clock last
//! entered `Running`. It is a pure state machine over explicit real-time
//! readings, which keeps every transition unit-testable without threads.

use crate::types::Time;

/// Whether simulated time tracks real time or stands still.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ClockMode {
    /// Simulated time advances 1:1 with real monotonic time.
    Running,
    /// Simulated time is pinned until warped or unfrozen.
    Frozen,
}

/// Time bookkeeping for the mock clock.
///
/// Mode semantics for the observed time:
///
/// - `Frozen`: `mocked_now() = simulated_time`, constant until warped.
/// - `Running`: `mocked_now() = real_now - unfreeze_reference + simulated_time`,
///   so simulated time tracks real elapsed time from the moment the clock
///   entered `Running`, offset by whatever had already accumulated.
#[derive(Debug, Clone, Copy)]
pub struct ClockState {
    mode: ClockMode,
    /// Accumulated simulated time. In `Frozen` mode this is the observed value;
    /// in `Running` mode it is the baseline real elapsed time is added to.
    simulated_time: Time,
    /// Real reading captured when the clock last entered or rebased `Running`.
    /// Meaningless while `Frozen`.
    unfreeze_reference: Time,
}

impl ClockState {
    /// Creates the state machine in `mode`, anchored at the real reading `real_now`.
    #[must_use]
    pub fn new(mode: ClockMode, real_now: Time) -> Self {
        Self {
            mode,
            simulated_time: real_now,
            unfreeze_reference: real_now,
        }
    }

    /// Returns the current mode.
    #[must_use]
    pub fn mode(&self) -> ClockMode {
        self.mode
    }

    /// Computes the observed simulated time given the real reading `real_now`.
    #[must_use]
    pub fn mocked_now(&self, real_now: Time) -> Time {
        match self.mode {
            ClockMode::Frozen => self.simulated_time,
            ClockMode::Running => self
                .simulated_time
                .saturating_add_nanos(real_now.duration_since(self.unfreeze_reference)),
        }
    }

    /// Pins simulated time at its current observed value.
    ///
    /// Idempotent: freezing a frozen clock changes nothing.
    pub fn freeze(&mut self, real_now: Time) {
        if self.mode == ClockMode::Running {
            self.simulated_time = self.mocked_now(real_now);
            self.mode = ClockMode::Frozen;
        }
    }

    /// Resumes 1:1 tracking of real time from the frozen value.
    ///
    /// Idempotent: unfreezing a running clock changes nothing.
    pub fn unfreeze(&mut self, real_now: Time) {
        if self.mode == ClockMode::Frozen {
            self.unfreeze_reference = real_now;
            self.mode = ClockMode::Running;
        }
    }

    /// Jumps simulated time forward by `delta_nanos`.
    ///
    /// Returns the new observed simulated time. In `Running` mode the real
    /// reference is rebased to `real_now` so tracking continues seamlessly
    /// from the warped value.
    pub fn advance(&mut self, delta_nanos: u64, real_now: Time) -> Time {
        let target = self.mocked_now(real_now).saturating_add_nanos(delta_nanos);
        self.simulated_time = target;
        if self.mode == ClockMode::Running {
            self.unfreeze_reference = real_now;
        }
        target
    }
}
