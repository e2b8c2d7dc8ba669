//! End-to-end behavior of the mock clock service.
//!
//! Frozen-mode and warp scenarios run against a manually driven time source,
//! so they are fully deterministic. The deadline-fire scenarios use the real
//! monotonic source with generous receive timeouts: they assert that a
//! delivery happens, never how fast.

use mockclock::{
    ClockMode, DeliveryId, ManualClock, MockClock, Time, TimeUnit,
};
use proptest::prelude::*;
use std::sync::{Arc, mpsc};
use std::time::Duration;

/// Installs a fmt subscriber so `RUST_LOG=mockclock=trace` surfaces the
/// service's schedule/cancel/warp/fire events during a test run. Idempotent;
/// the losing `try_init` in concurrent tests is ignored.
fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn frozen_clock() -> (MockClock<String>, Arc<ManualClock>) {
    init_tracing();
    let source = Arc::new(ManualClock::new());
    let clock = MockClock::with_source(ClockMode::Frozen, source.clone());
    (clock, source)
}

#[test]
fn frozen_warp_delivers_only_newly_due_entries() {
    let (clock, _source) = frozen_clock();
    let t0 = clock.now();
    let (tx, rx) = mpsc::channel();
    let tx = Arc::new(tx);

    clock.schedule_after(tx.clone(), Duration::from_millis(100), "a".to_owned());
    clock.schedule_after(tx, Duration::from_millis(50), "b".to_owned());

    clock.warp_by(60, TimeUnit::Millisecond);

    assert_eq!(rx.try_recv().as_deref(), Ok("b"));
    assert!(rx.try_recv().is_err());

    let pending = clock.pending_snapshot();
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0].1, t0 + Duration::from_millis(100));
}

#[test]
fn frozen_now_is_pinned_until_warp() {
    let (clock, source) = frozen_clock();
    let t0 = clock.now();

    source.advance(3_000_000_000);
    assert_eq!(clock.now(), t0);

    clock.warp_by(5, TimeUnit::Millisecond);
    assert_eq!(clock.now(), t0 + Duration::from_millis(5));
}

#[test]
fn running_now_advances_with_real_elapsed_time() {
    init_tracing();
    let source = Arc::new(ManualClock::new());
    let clock: MockClock<String> = MockClock::with_source(ClockMode::Running, source.clone());

    let t0 = clock.now();
    source.advance(42_000_000);
    let t1 = clock.now();
    assert_eq!(t1.duration_since(t0), 42_000_000);
}

#[test]
fn freeze_pins_time_and_unfreeze_keeps_original_deadline() {
    init_tracing();
    let source = Arc::new(ManualClock::new());
    let clock: MockClock<String> = MockClock::with_source(ClockMode::Running, source.clone());
    let (tx, _rx) = mpsc::channel();

    clock.schedule_after(Arc::new(tx), Duration::from_millis(10), "x".to_owned());
    let due_at = clock.pending_snapshot()[0].1;

    clock.freeze();
    let pinned = clock.now();

    // 50ms of real time elapse while frozen; observed time does not move.
    source.advance(50_000_000);
    assert_eq!(clock.now(), pinned);
    assert_eq!(clock.now(), pinned);

    clock.unfreeze();
    assert_eq!(clock.mode(), ClockMode::Running);
    // The deadline is still the originally computed absolute simulated time,
    // not restarted from the unfreeze point.
    assert_eq!(clock.pending_snapshot()[0].1, due_at);
}

#[test]
fn cancel_before_warp_suppresses_delivery_forever() {
    let (clock, _source) = frozen_clock();
    let (tx, rx) = mpsc::channel();

    let id = clock.schedule_after(Arc::new(tx), Duration::from_millis(5), "m1".to_owned());
    clock.cancel(id);

    clock.warp_by(1000, TimeUnit::Millisecond);
    assert!(rx.try_recv().is_err());
    assert!(clock.history().iter().all(|entry| entry.id != id));
}

#[test]
fn cancel_after_delivery_is_a_noop() {
    let (clock, _source) = frozen_clock();
    let (tx, rx) = mpsc::channel();

    let id = clock.schedule_after(Arc::new(tx), Duration::from_millis(5), "m".to_owned());
    clock.warp_by(10, TimeUnit::Millisecond);
    assert_eq!(rx.try_recv().as_deref(), Ok("m"));

    clock.cancel(id);
    assert_eq!(clock.history().len(), 1);
    assert_eq!(clock.history()[0].id, id);
}

#[test]
fn split_warp_equals_single_warp() {
    let run = |warps: &[u64]| -> (Time, Vec<String>) {
        let (clock, _source) = frozen_clock();
        let (tx, rx) = mpsc::channel();
        let tx = Arc::new(tx);
        for ms in [30u64, 70, 110, 150] {
            clock.schedule_after(tx.clone(), Duration::from_millis(ms), format!("at{ms}"));
        }
        for &w in warps {
            clock.warp_by(w, TimeUnit::Millisecond);
        }
        (clock.now(), rx.try_iter().collect())
    };

    let (now_split, delivered_split) = run(&[40, 80]);
    let (now_single, delivered_single) = run(&[120]);

    assert_eq!(
        now_split.duration_since(Time::ZERO),
        now_single.duration_since(Time::ZERO)
    );
    assert_eq!(delivered_split, delivered_single);
    assert_eq!(delivered_split, ["at30", "at70", "at110"]);
}

#[test]
fn equal_deadlines_deliver_in_schedule_order() {
    let (clock, _source) = frozen_clock();
    let (tx, rx) = mpsc::channel();
    let tx = Arc::new(tx);

    for label in ["first", "second", "third"] {
        clock.schedule_after(tx.clone(), Duration::from_millis(25), label.to_owned());
    }
    clock.warp_by(25, TimeUnit::Millisecond);

    let delivered: Vec<String> = rx.try_iter().collect();
    assert_eq!(delivered, ["first", "second", "third"]);
}

#[test]
fn deadline_fires_asynchronously_while_running() {
    init_tracing();
    let clock: MockClock<String> = MockClock::new(ClockMode::Running);
    let (tx, rx) = mpsc::channel();

    clock.schedule_after(Arc::new(tx), Duration::from_millis(2), "fired".to_owned());

    let payload = rx.recv_timeout(Duration::from_secs(5)).unwrap();
    assert_eq!(payload, "fired");
    assert_eq!(clock.pending_len(), 0);
    assert_eq!(clock.history().len(), 1);
}

#[test]
fn already_due_entry_still_fires_through_the_deadline_path() {
    init_tracing();
    let clock: MockClock<String> = MockClock::new(ClockMode::Running);
    let (tx, rx) = mpsc::channel();

    // Zero interval: due the instant it is scheduled. It must still arrive
    // via the (clamped-to-zero) deadline fire, not a synchronous inline
    // delivery, so the schedule call returns before the payload lands.
    clock.schedule_after(Arc::new(tx), Duration::ZERO, "immediate".to_owned());

    let payload = rx.recv_timeout(Duration::from_secs(5)).unwrap();
    assert_eq!(payload, "immediate");
}

#[test]
fn frozen_clock_delivers_nothing_without_a_warp() {
    let (clock, source) = frozen_clock();
    let (tx, rx) = mpsc::channel();

    clock.schedule_after(Arc::new(tx), Duration::from_millis(1), "never".to_owned());
    source.advance(10_000_000_000);

    assert!(
        rx.recv_timeout(Duration::from_millis(50)).is_err(),
        "frozen clock must not deliver on real elapse"
    );
    assert_eq!(clock.pending_len(), 1);
}

#[test]
fn unfreeze_arms_deadline_for_pending_entries() {
    init_tracing();
    let clock: MockClock<String> = MockClock::new(ClockMode::Frozen);
    let (tx, rx) = mpsc::channel();

    clock.schedule_after(Arc::new(tx), Duration::from_millis(2), "thawed".to_owned());
    assert!(rx.recv_timeout(Duration::from_millis(50)).is_err());

    clock.unfreeze();
    let payload = rx.recv_timeout(Duration::from_secs(5)).unwrap();
    assert_eq!(payload, "thawed");
}

#[test]
fn ids_are_unique_across_clocks() {
    let (clock_a, _sa) = frozen_clock();
    let (clock_b, _sb) = frozen_clock();
    let (tx, _rx) = mpsc::channel();
    let tx = Arc::new(tx);

    let mut ids: Vec<DeliveryId> = Vec::new();
    for _ in 0..10 {
        ids.push(clock_a.schedule_after(tx.clone(), Duration::from_millis(1), String::new()));
        ids.push(clock_b.schedule_after(tx.clone(), Duration::from_millis(1), String::new()));
    }
    let mut deduped = ids.clone();
    deduped.sort_unstable();
    deduped.dedup();
    assert_eq!(deduped.len(), ids.len());
}

proptest! {
    /// Pending stays sorted by scheduled time at every observation point,
    /// whatever the schedule order.
    #[test]
    fn pending_snapshot_is_always_sorted(intervals in prop::collection::vec(0u64..10_000, 1..50)) {
        let (clock, _source) = frozen_clock();
        let (tx, _rx) = mpsc::channel();
        let tx = Arc::new(tx);

        for ms in intervals {
            clock.schedule_after(tx.clone(), Duration::from_millis(ms), String::new());
            let times: Vec<Time> = clock.pending_snapshot().iter().map(|&(_, t)| t).collect();
            prop_assert!(times.windows(2).all(|w| w[0] <= w[1]));
        }
    }

    /// Warping in two steps delivers the same set as one combined warp.
    #[test]
    fn warp_composition_delivers_same_set(
        intervals in prop::collection::vec(1u64..200, 1..20),
        x in 1u64..150,
        y in 1u64..150,
    ) {
        let deliver_all = |warps: &[u64]| -> Vec<String> {
            let (clock, _source) = frozen_clock();
            let (tx, rx) = mpsc::channel();
            let tx = Arc::new(tx);
            for (i, &ms) in intervals.iter().enumerate() {
                clock.schedule_after(tx.clone(), Duration::from_millis(ms), format!("{i}@{ms}"));
            }
            for &w in warps {
                clock.warp_by(w, TimeUnit::Millisecond);
            }
            rx.try_iter().collect()
        };

        prop_assert_eq!(deliver_all(&[x, y]), deliver_all(&[x + y]));
    }
}
