//! Mockclock: a deterministic, controllable clock and deferred-delivery
//! service for testing time-dependent code.
//!
//! # Overview
//!
//! Code that waits on timers is miserable to test against a real clock: tests
//! either sleep for real wall time or flake on timing races. This crate is a
//! drop-in substitute for the two primitives such code needs ("what time is
//! it" and "deliver this message after an interval, unless cancelled") with
//! simulated time the test can advance, freeze, and inspect.
//!
//! # Core guarantees
//!
//! - **Total serialization**: every operation, including the deadline firing,
//!   goes through one serialization point; nothing observes clock state
//!   mid-mutation.
//! - **Single deadline**: at most one real timer is outstanding at any
//!   instant, and it always corresponds to the earliest pending delivery.
//! - **Never early**: a fired deadline never precedes its simulated due time.
//! - **Stable ordering**: pending deliveries stay sorted by scheduled time,
//!   FIFO among ties.
//! - **Total operations**: `cancel`, `freeze`, and `unfreeze` are idempotent
//!   no-ops when there is nothing to do; nothing in the steady state fails.
//!
//! # Module structure
//!
//! - [`types`]: simulated-time primitives ([`Time`], [`TimeUnit`],
//!   [`DeliveryId`])
//! - [`source`]: the real-clock seam ([`TimeSource`], [`MonotonicClock`],
//!   [`ManualClock`])
//! - [`queue`]: the ordered pending-delivery set
//! - [`clock`]: the freeze/run state machine
//! - [`service`]: the serialized [`MockClock`] service
//! - [`registry`]: well-known-name claims for the singleton convention
//! - [`error`](mod@error): error types
//!
//! # Example
//!
//! ```
//! use mockclock::{ClockMode, MockClock, TimeUnit};
//! use std::sync::{Arc, mpsc};
//! use std::time::Duration;
//!
//! let clock: MockClock<&str> = MockClock::new(ClockMode::Frozen);
//! let (tx, rx) = mpsc::channel();
//!
//! clock.schedule_after(Arc::new(tx), Duration::from_millis(50), "ding");
//! clock.warp_by(50, TimeUnit::Millisecond);
//!
//! assert_eq!(rx.try_recv(), Ok("ding"));
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_const_for_fn)]
#![allow(clippy::doc_markdown)]
#![allow(clippy::cast_possible_truncation)]

pub mod clock;
pub mod error;
pub mod queue;
pub mod registry;
pub mod service;
pub mod source;
pub mod types;

pub use clock::{ClockMode, ClockState};
pub use error::ClockError;
pub use queue::{DeferredDelivery, DeliveryQueue};
pub use registry::ClockLease;
pub use service::{FnRecipient, HistoryEntry, MockClock, Recipient};
pub use source::{ManualClock, MonotonicClock, TimeSource};
pub use types::{DeliveryId, Time, TimeUnit};
