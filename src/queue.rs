//! Ordered set of pending deferred deliveries.
//!
//! Entries are kept sorted ascending by scheduled time, with a per-queue
//! insertion counter breaking ties so equal deadlines drain in FIFO order.
//! A sorted vector rather than a heap, because cancellation by id and ordered
//! observation are part of the contract, not just pop-min.

use crate::types::{DeliveryId, Time};
use smallvec::SmallVec;

/// One scheduled delivery awaiting its deadline.
#[derive(Debug, Clone)]
pub struct DeferredDelivery<T> {
    /// Unique token for cancellation and deadline matching.
    pub id: DeliveryId,
    /// Absolute simulated time at which delivery becomes due.
    pub scheduled_time: Time,
    /// Insertion counter, FIFO tie-break among equal scheduled times.
    seq: u64,
    /// Caller-owned cargo (recipient handle plus payload).
    pub item: T,
}

/// A queue of deliveries ordered by `(scheduled_time, seq)`.
#[derive(Debug, Default)]
pub struct DeliveryQueue<T> {
    entries: Vec<DeferredDelivery<T>>,
    next_seq: u64,
}

impl<T> DeliveryQueue<T> {
    /// Creates a new empty queue.
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            next_seq: 0,
        }
    }

    /// Returns the number of pending deliveries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if nothing is pending.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Inserts a delivery due at `scheduled_time`.
    ///
    /// The entry lands after every existing entry with an equal or earlier
    /// scheduled time, so earlier insertions keep priority among ties.
    pub fn insert(&mut self, id: DeliveryId, scheduled_time: Time, item: T) {
        let seq = self.next_seq;
        self.next_seq += 1;
        let pos = self
            .entries
            .partition_point(|e| e.scheduled_time <= scheduled_time);
        self.entries.insert(
            pos,
            DeferredDelivery {
                id,
                scheduled_time,
                seq,
                item,
            },
        );
        debug_assert!(self.is_sorted());
    }

    /// Returns the earliest scheduled time, if any.
    #[must_use]
    pub fn peek_deadline(&self) -> Option<Time> {
        self.entries.first().map(|e| e.scheduled_time)
    }

    /// Removes and returns the head entry if it is due at `now`.
    pub fn pop_head_due(&mut self, now: Time) -> Option<DeferredDelivery<T>> {
        if self.entries.first()?.scheduled_time <= now {
            Some(self.entries.remove(0))
        } else {
            None
        }
    }

    /// Removes and returns every entry due at `now`, oldest-scheduled first.
    pub fn pop_due(&mut self, now: Time) -> SmallVec<[DeferredDelivery<T>; 4]> {
        let cut = self.entries.partition_point(|e| e.scheduled_time <= now);
        self.entries.drain(..cut).collect()
    }

    /// Removes the entry with the given id.
    ///
    /// Returns true if an entry was removed. Unknown ids are a no-op.
    pub fn cancel(&mut self, id: DeliveryId) -> bool {
        match self.entries.iter().position(|e| e.id == id) {
            Some(pos) => {
                self.entries.remove(pos);
                true
            }
            None => false,
        }
    }

    /// Iterates over pending entries in delivery order.
    pub fn iter(&self) -> impl Iterator<Item = &DeferredDelivery<T>> {
        self.entries.iter()
    }

    fn is_sorted(&self) -> bool {
        self.entries
            .windows(2)
            .all(|w| (w[0].scheduled_time, w[0].seq) < (w[1].scheduled_time, w[1].seq))
    }
}
