//! The mock clock service.
//!
//! One [`MockClock`] instance plays the role a process's monotonic clock and
//! timer facility would: it answers "what time is it" and "deliver this
//! payload to that recipient after an interval, unless cancelled", except
//! time is simulated and fully under the test's control.
//!
//! # Serialization
//!
//! Every public operation locks one coarse mutex around the whole clock
//! state, mutates it, and pairs the mutation with a re-arm of the single
//! deadline before the lock is released. No two operations ever observe the
//! state concurrently, and no operation is served between a pending-set
//! mutation and the corresponding re-arm. That total serialization is the
//! correctness mechanism: reads of `now()`, schedules, cancellations,
//! deadline firings, and warps cannot race each other.
//!
//! # The single deadline
//!
//! A dedicated worker thread owns the one real deadline. It sleeps on a
//! condition variable until the head of the pending queue is due, fires it,
//! and re-arms for the new head. The wait is always
//! `max(0, scheduled_time - mocked_now())`, so a firing is never observed
//! early relative to simulated time; an already-due entry is clamped to a
//! zero wait and still travels this asynchronous fire path rather than being
//! delivered inline. While the clock is `Frozen` the worker parks with no
//! deadline at all.
//!
//! # Re-entrancy
//!
//! Deliveries are dispatched while the state lock is held. A recipient must
//! not call back into the clock from `deliver`; hand the payload off (e.g.
//! to a channel) and return.

use crate::clock::{ClockMode, ClockState};
use crate::queue::{DeferredDelivery, DeliveryQueue};
use crate::source::{MonotonicClock, TimeSource};
use crate::types::{DeliveryId, Time, TimeUnit};
use parking_lot::{Condvar, Mutex};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

/// An addressable destination for delivered payloads.
///
/// The clock never interprets the handle; delivery is a fire-and-forget
/// handoff with no reply expected. Implementations must not call back into
/// the [`MockClock`] from [`deliver`](Recipient::deliver).
pub trait Recipient<P>: Send + Sync {
    /// Accepts one delivered payload.
    fn deliver(&self, payload: P);
}

/// Channel senders are recipients: delivery is a send, and a hung-up
/// receiver is silently absorbed.
impl<P: Send> Recipient<P> for std::sync::mpsc::Sender<P> {
    fn deliver(&self, payload: P) {
        let _ = self.send(payload);
    }
}

/// Adapter turning a closure into a [`Recipient`].
///
/// A wrapper rather than a blanket impl so closure recipients cannot
/// conflict with channel recipients in trait resolution.
pub struct FnRecipient<F>(F);

impl<F> FnRecipient<F> {
    /// Wraps a closure as a recipient.
    pub const fn new(f: F) -> Self {
        Self(f)
    }
}

impl<P, F> Recipient<P> for FnRecipient<F>
where
    F: Fn(P) + Send + Sync,
{
    fn deliver(&self, payload: P) {
        (self.0)(payload);
    }
}

/// Record of one completed delivery, kept for test assertions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryEntry<P> {
    /// The id the delivery was scheduled under.
    pub id: DeliveryId,
    /// The absolute simulated time it was due at.
    pub scheduled_time: Time,
    /// The payload that was handed to the recipient.
    pub payload: P,
}

/// Cargo carried by a pending queue entry.
struct Armed<P> {
    recipient: Arc<dyn Recipient<P>>,
    payload: P,
}

impl<P: std::fmt::Debug> std::fmt::Debug for Armed<P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Armed")
            .field("payload", &self.payload)
            .finish_non_exhaustive()
    }
}

struct Shared<P> {
    clock: ClockState,
    pending: DeliveryQueue<Armed<P>>,
    /// Delivered records in delivery order; accessors reverse to
    /// most-recent-first. Never consulted by scheduling logic.
    history: Vec<HistoryEntry<P>>,
    shutdown: bool,
}

struct Inner<P> {
    source: Arc<dyn TimeSource>,
    shared: Mutex<Shared<P>>,
    /// Signalled whenever the pending set or the time baseline changes while
    /// the clock should end up `Running`, so the worker recomputes its wait.
    rearm: Condvar,
}

/// A deterministic, controllable substitute for a monotonic clock and
/// delayed-message facility.
///
/// Construct one per test run and inject it into the code under test. All
/// operations are total: they never fail, and `cancel`/`freeze`/`unfreeze`
/// are idempotent no-ops when there is nothing to do.
///
/// # Example
///
/// ```
/// use mockclock::{ClockMode, MockClock, TimeUnit};
/// use std::sync::{Arc, mpsc};
/// use std::time::Duration;
///
/// let clock: MockClock<&str> = MockClock::new(ClockMode::Frozen);
/// let (tx, rx) = mpsc::channel();
/// let sender = Arc::new(tx);
///
/// clock.schedule_after(sender.clone(), Duration::from_millis(100), "later");
/// clock.schedule_after(sender, Duration::from_millis(50), "sooner");
///
/// clock.warp_by(60, TimeUnit::Millisecond);
/// assert_eq!(rx.try_recv(), Ok("sooner"));
/// assert!(rx.try_recv().is_err());
/// assert_eq!(clock.pending_len(), 1);
/// ```
pub struct MockClock<P: Clone + Send + 'static> {
    inner: Arc<Inner<P>>,
    worker: Option<JoinHandle<()>>,
}

impl<P: Clone + Send + 'static> MockClock<P> {
    /// Creates a clock in `mode`, tracking real time via [`MonotonicClock`].
    ///
    /// Simulated time starts at the real monotonic reading (zero, since the
    /// source's epoch is construction time).
    #[must_use]
    pub fn new(mode: ClockMode) -> Self {
        Self::with_source(mode, Arc::new(MonotonicClock::new()))
    }

    /// Creates a clock in `mode` over an explicit real-time source.
    ///
    /// Tests pass a [`ManualClock`](crate::ManualClock) here to make
    /// `Running`-mode behavior deterministic.
    #[must_use]
    pub fn with_source(mode: ClockMode, source: Arc<dyn TimeSource>) -> Self {
        let real_now = source.now();
        let inner = Arc::new(Inner {
            source,
            shared: Mutex::new(Shared {
                clock: ClockState::new(mode, real_now),
                pending: DeliveryQueue::new(),
                history: Vec::new(),
                shutdown: false,
            }),
            rearm: Condvar::new(),
        });
        let worker = {
            let inner = Arc::clone(&inner);
            std::thread::spawn(move || deadline_loop(&inner))
        };
        Self {
            inner,
            worker: Some(worker),
        }
    }

    /// Returns the current simulated time.
    #[must_use]
    pub fn now(&self) -> Time {
        let shared = self.inner.shared.lock();
        shared.clock.mocked_now(self.inner.source.now())
    }

    /// Returns the current mode.
    #[must_use]
    pub fn mode(&self) -> ClockMode {
        self.inner.shared.lock().clock.mode()
    }

    /// Schedules `payload` for delivery to `recipient` after `interval` of
    /// simulated time.
    ///
    /// Returns the id to cancel with. Duplicate recipient/payload
    /// combinations are allowed.
    pub fn schedule_after(
        &self,
        recipient: Arc<dyn Recipient<P>>,
        interval: Duration,
        payload: P,
    ) -> DeliveryId {
        let id = DeliveryId::mint();
        let mut shared = self.inner.shared.lock();
        let scheduled = shared.clock.mocked_now(self.inner.source.now()) + interval;
        shared
            .pending
            .insert(id, scheduled, Armed { recipient, payload });
        tracing::debug!(%id, due = %scheduled, "scheduled deferred delivery");
        if shared.clock.mode() == ClockMode::Running {
            self.inner.rearm.notify_one();
        }
        id
    }

    /// Cancels the pending delivery with the given id.
    ///
    /// Cancelling an unknown or already-delivered id is a no-op: there is no
    /// race with a firing deadline because both are serialized through the
    /// same lock, so a delivery is either still pending and cancellable or
    /// already in history.
    pub fn cancel(&self, id: DeliveryId) {
        let mut shared = self.inner.shared.lock();
        let removed = shared.pending.cancel(id);
        tracing::debug!(%id, removed, "cancel requested");
        if removed && shared.clock.mode() == ClockMode::Running {
            self.inner.rearm.notify_one();
        }
    }

    /// Pins simulated time at its current value.
    ///
    /// Nothing is delivered while frozen until an explicit warp. Idempotent.
    pub fn freeze(&self) {
        let mut shared = self.inner.shared.lock();
        shared.clock.freeze(self.inner.source.now());
        tracing::debug!(now = %shared.clock.mocked_now(self.inner.source.now()), "clock frozen");
        self.inner.rearm.notify_one();
    }

    /// Resumes 1:1 tracking of real time and re-arms the deadline for the
    /// earliest pending entry, if any. Idempotent.
    pub fn unfreeze(&self) {
        let mut shared = self.inner.shared.lock();
        shared.clock.unfreeze(self.inner.source.now());
        tracing::debug!(now = %shared.clock.mocked_now(self.inner.source.now()), "clock unfrozen");
        self.inner.rearm.notify_one();
    }

    /// Advances simulated time by `interval` of `unit` instantly.
    ///
    /// Every pending entry whose scheduled time falls within the jump is
    /// delivered synchronously, oldest-scheduled first, before this returns.
    /// Valid in both modes; in `Running` mode real-time tracking continues
    /// seamlessly from the warped value.
    pub fn warp_by(&self, interval: u64, unit: TimeUnit) {
        let delta = unit.to_nanos(interval);
        let mut shared = self.inner.shared.lock();
        let real_now = self.inner.source.now();
        let target = shared
            .clock
            .mocked_now(real_now)
            .saturating_add_nanos(delta);
        let due = shared.pending.pop_due(target);
        for entry in due {
            deliver(&mut shared, entry);
        }
        shared.clock.advance(delta, real_now);
        tracing::debug!(now = %target, "warped simulated time");
        if shared.clock.mode() == ClockMode::Running {
            self.inner.rearm.notify_one();
        }
    }

    /// [`warp_by`](Self::warp_by) taking a `Duration`.
    pub fn warp(&self, interval: Duration) {
        let nanos = interval.as_nanos().min(u128::from(u64::MAX)) as u64;
        self.warp_by(nanos, TimeUnit::Nanosecond);
    }

    /// Returns the number of pending deliveries.
    #[must_use]
    pub fn pending_len(&self) -> usize {
        self.inner.shared.lock().pending.len()
    }

    /// Returns `(id, scheduled_time)` for every pending delivery, in
    /// delivery order.
    #[must_use]
    pub fn pending_snapshot(&self) -> Vec<(DeliveryId, Time)> {
        self.inner
            .shared
            .lock()
            .pending
            .iter()
            .map(|e| (e.id, e.scheduled_time))
            .collect()
    }

    /// Returns completed deliveries, most recently delivered first.
    #[must_use]
    pub fn history(&self) -> Vec<HistoryEntry<P>> {
        self.inner
            .shared
            .lock()
            .history
            .iter()
            .rev()
            .cloned()
            .collect()
    }
}

impl<P: Clone + Send + 'static> Drop for MockClock<P> {
    fn drop(&mut self) {
        {
            let mut shared = self.inner.shared.lock();
            shared.shutdown = true;
            self.inner.rearm.notify_one();
        }
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
    }
}

impl<P: Clone + Send + std::fmt::Debug + 'static> std::fmt::Debug for MockClock<P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let shared = self.inner.shared.lock();
        f.debug_struct("MockClock")
            .field("mode", &shared.clock.mode())
            .field("pending", &shared.pending.len())
            .field("delivered", &shared.history.len())
            .finish_non_exhaustive()
    }
}

/// Removes one due entry from the books and hands its payload off.
///
/// Runs with the state lock held, so no operation can interleave between the
/// removal, the history append, and the dispatch.
fn deliver<P: Clone>(shared: &mut Shared<P>, entry: DeferredDelivery<Armed<P>>) {
    tracing::trace!(id = %entry.id, due = %entry.scheduled_time, "delivering");
    let Armed { recipient, payload } = entry.item;
    shared.history.push(HistoryEntry {
        id: entry.id,
        scheduled_time: entry.scheduled_time,
        payload: payload.clone(),
    });
    recipient.deliver(payload);
}

/// Worker loop owning the single real deadline.
///
/// Holds the state lock except while parked on the condvar, so a firing and
/// any public operation are mutually exclusive by construction.
fn deadline_loop<P: Clone + Send + 'static>(inner: &Inner<P>) {
    let mut shared = inner.shared.lock();
    loop {
        if shared.shutdown {
            break;
        }
        let armed = match shared.clock.mode() {
            ClockMode::Running => shared.pending.peek_deadline(),
            ClockMode::Frozen => None,
        };
        let Some(deadline) = armed else {
            inner.rearm.wait(&mut shared);
            continue;
        };
        let now = shared.clock.mocked_now(inner.source.now());
        let wait = deadline.duration_since(now);
        if wait == 0 {
            if let Some(entry) = shared.pending.pop_head_due(now) {
                deliver(&mut shared, entry);
            }
        } else {
            // Timeout or re-arm notification; either way the head deadline
            // is recomputed from fresh readings on the next pass, so a fire
            // is never early relative to mocked_now().
            let _ = inner.rearm.wait_for(&mut shared, Duration::from_nanos(wait));
        }
    }
}
