//! Well-known-name registration for the singleton convention.
//!
//! The clock itself is an explicitly constructed object injected into the
//! code under test; nothing forces a single instance. Harnesses that want
//! the one-clock-per-run convention enforced claim a process-wide name and
//! hold the resulting [`ClockLease`] for the duration of the run. A second
//! claim on the same name fails with
//! [`ClockError::AlreadyRegistered`](crate::ClockError::AlreadyRegistered),
//! which is the duplicate-registration error a global clock facility would
//! raise. Dropping the lease releases the name.

use crate::error::ClockError;
use parking_lot::Mutex;
use std::collections::BTreeSet;
use std::sync::OnceLock;

static CLAIMED_NAMES: OnceLock<Mutex<BTreeSet<String>>> = OnceLock::new();

fn claimed() -> &'static Mutex<BTreeSet<String>> {
    CLAIMED_NAMES.get_or_init(|| Mutex::new(BTreeSet::new()))
}

/// Exclusive claim on a well-known clock name.
///
/// The name stays claimed until the lease is dropped.
#[derive(Debug)]
#[must_use = "dropping the lease releases the name immediately"]
pub struct ClockLease {
    name: String,
}

impl ClockLease {
    /// Claims `name` for this process.
    ///
    /// # Errors
    ///
    /// Returns [`ClockError::AlreadyRegistered`] if the name is held by a
    /// live lease.
    pub fn claim(name: impl Into<String>) -> Result<Self, ClockError> {
        let name = name.into();
        let mut names = claimed().lock();
        if !names.insert(name.clone()) {
            return Err(ClockError::AlreadyRegistered { name });
        }
        tracing::debug!(name = %name, "clock name claimed");
        Ok(Self { name })
    }

    /// The claimed name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl Drop for ClockLease {
    fn drop(&mut self) {
        claimed().lock().remove(&self.name);
        tracing::debug!(name = %self.name, "clock name released");
    }
}
