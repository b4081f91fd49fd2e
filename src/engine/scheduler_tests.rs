#![allow(clippy::unwrap_used)]

use std::cell::RefCell;
use std::rc::Rc;

use rust_decimal_macros::dec;

use super::*;
use crate::engine::space::PlanScope;
use crate::engine::testing::{sample_categories, MemoryStore};
use crate::error::StoreError;
use crate::models::Month;

const SETTLE: Duration = Duration::from_secs(2);

fn setup() -> (ManualClock, SyncScheduler<ManualClock>, EditBuffer, MemoryStore) {
    let clock = ManualClock::new();
    let scheduler = SyncScheduler::new(clock.clone(), SyncSettings::default());
    let buffer = EditBuffer::new(PlanScope::live(2025));
    let store = MemoryStore::with_categories(sample_categories());
    (clock, scheduler, buffer, store)
}

fn edit(
    scheduler: &mut SyncScheduler<ManualClock>,
    buffer: &mut EditBuffer,
    category_id: i64,
    month: u32,
    amount: rust_decimal::Decimal,
) {
    buffer
        .set_value(&sample_categories(), category_id, month, amount)
        .unwrap();
    scheduler.notify_edit(buffer.len());
}

fn m(n: u32) -> Month {
    Month::new(n).unwrap()
}

// ── Debounce ──────────────────────────────────────────────────

#[test]
fn test_edit_arms_timer() {
    let (clock, mut sched, mut buf, _) = setup();
    assert_eq!(sched.state(), SyncState::Idle);
    edit(&mut sched, &mut buf, 1, 1, dec!(3000));
    assert_eq!(sched.state(), SyncState::Armed);
    assert_eq!(sched.deadline(), Some(clock.now() + SETTLE));
    assert_eq!(sched.time_until_due(), Some(SETTLE));
}

#[test]
fn test_nothing_written_before_window_expires() {
    let (clock, mut sched, mut buf, mut store) = setup();
    edit(&mut sched, &mut buf, 1, 1, dec!(3000));
    clock.advance(Duration::from_millis(1999));
    assert!(sched.tick(&mut buf, &mut store).is_none());
    assert_eq!(store.writes, 0);
    assert_eq!(buf.len(), 1);
}

#[test]
fn test_each_edit_restarts_window() {
    let (clock, mut sched, mut buf, mut store) = setup();
    edit(&mut sched, &mut buf, 1, 1, dec!(3000));
    clock.advance(Duration::from_millis(1900));
    edit(&mut sched, &mut buf, 2, 1, dec!(1000));
    clock.advance(Duration::from_millis(1900));
    assert!(sched.tick(&mut buf, &mut store).is_none());

    clock.advance(Duration::from_millis(100));
    let report = sched.tick(&mut buf, &mut store).unwrap().unwrap();
    assert_eq!(report.written, 2);
    assert_eq!(store.writes, 1);
}

#[test]
fn test_flush_clears_buffer_and_goes_idle() {
    let (clock, mut sched, mut buf, mut store) = setup();
    edit(&mut sched, &mut buf, 1, 1, dec!(3000));
    edit(&mut sched, &mut buf, 1, 1, dec!(3100));
    clock.advance(SETTLE);

    let report = sched.tick(&mut buf, &mut store).unwrap().unwrap();
    assert_eq!(report.cleared, 1);
    assert_eq!(report.remaining, 0);
    assert!(buf.is_empty());
    assert_eq!(sched.state(), SyncState::Idle);
    assert_eq!(sched.deadline(), None);
    assert_eq!(store.facts.len(), 1);
    assert_eq!(store.facts[0].amount, dec!(3100));
}

#[test]
fn test_manual_save_skips_window() {
    let (_clock, mut sched, mut buf, mut store) = setup();
    edit(&mut sched, &mut buf, 2, 5, dec!(1000));
    let report = sched.flush_now(&mut buf, &mut store).unwrap().unwrap();
    assert_eq!(report.written, 1);
    assert!(buf.is_empty());
    assert_eq!(sched.state(), SyncState::Idle);
}

#[test]
fn test_manual_save_with_empty_buffer_is_noop() {
    let (_clock, mut sched, mut buf, mut store) = setup();
    assert!(sched.flush_now(&mut buf, &mut store).is_none());
    assert_eq!(store.writes, 0);
    assert_eq!(sched.state(), SyncState::Idle);
}

// ── Failure ───────────────────────────────────────────────────

#[test]
fn test_failed_flush_keeps_every_edit() {
    let (clock, mut sched, mut buf, mut store) = setup();
    store.fail_writes = 1;
    edit(&mut sched, &mut buf, 1, 1, dec!(3000));
    edit(&mut sched, &mut buf, 2, 1, dec!(1000));
    clock.advance(SETTLE);

    let err = sched.tick(&mut buf, &mut store).unwrap().unwrap_err();
    assert!(matches!(err, FlushError::Store(StoreError::Unavailable(_))));
    assert_eq!(buf.len(), 2);
    assert_eq!(buf.get(1, m(1)).unwrap().amount, dec!(3000));
    assert!(store.facts.is_empty());

    let status = sched.status();
    assert_eq!(status.state, SyncState::Armed);
    assert_eq!(status.pending_count, 2);
    assert!(status.last_error.is_some());
}

#[test]
fn test_failure_rearms_and_next_attempt_succeeds() {
    let (clock, mut sched, mut buf, mut store) = setup();
    store.fail_writes = 1;
    edit(&mut sched, &mut buf, 1, 1, dec!(3000));
    clock.advance(SETTLE);
    assert!(sched.tick(&mut buf, &mut store).unwrap().is_err());
    assert_eq!(sched.deadline(), Some(clock.now() + SETTLE));

    clock.advance(SETTLE);
    assert!(sched.tick(&mut buf, &mut store).unwrap().is_ok());
    assert!(buf.is_empty());
    assert_eq!(sched.status().last_error, None);
}

#[test]
fn test_automatic_retries_are_bounded() {
    let (clock, mut sched, mut buf, mut store) = setup();
    store.fail_writes = 10;
    edit(&mut sched, &mut buf, 1, 1, dec!(3000));

    clock.advance(SETTLE);
    assert!(sched.tick(&mut buf, &mut store).unwrap().is_err());
    clock.advance(SETTLE);
    assert!(sched.tick(&mut buf, &mut store).unwrap().is_err());

    // out of automatic attempts: parked until something happens
    assert_eq!(sched.state(), SyncState::Armed);
    assert_eq!(sched.deadline(), None);
    clock.advance(SETTLE * 10);
    assert!(sched.tick(&mut buf, &mut store).is_none());
    assert_eq!(buf.len(), 1);
}

#[test]
fn test_new_edit_after_parking_rearms() {
    let (clock, mut sched, mut buf, mut store) = setup();
    store.fail_writes = 2;
    edit(&mut sched, &mut buf, 1, 1, dec!(3000));
    for _ in 0..2 {
        clock.advance(SETTLE);
        let _ = sched.tick(&mut buf, &mut store);
    }
    assert_eq!(sched.deadline(), None);

    edit(&mut sched, &mut buf, 1, 2, dec!(3000));
    clock.advance(SETTLE);
    assert!(sched.tick(&mut buf, &mut store).unwrap().is_ok());
    assert_eq!(store.facts.len(), 2);
}

#[test]
fn test_manual_save_after_parking() {
    let (clock, mut sched, mut buf, mut store) = setup();
    store.fail_writes = 2;
    edit(&mut sched, &mut buf, 1, 1, dec!(3000));
    for _ in 0..2 {
        clock.advance(SETTLE);
        let _ = sched.tick(&mut buf, &mut store);
    }
    assert!(sched.flush_now(&mut buf, &mut store).unwrap().is_ok());
    assert!(buf.is_empty());
}

// ── In-flight ─────────────────────────────────────────────────

#[test]
fn test_only_one_flush_in_flight() {
    let (_clock, mut sched, mut buf, _) = setup();
    edit(&mut sched, &mut buf, 1, 1, dec!(3000));
    let first = sched.begin_flush(&buf);
    assert!(matches!(first, BeginFlush::Started(_)));
    assert_eq!(sched.state(), SyncState::Flushing);
    assert_eq!(sched.begin_flush(&buf), BeginFlush::Queued);
}

#[test]
fn test_edits_during_flight_survive_success() {
    let (clock, mut sched, mut buf, _) = setup();
    edit(&mut sched, &mut buf, 1, 1, dec!(3000));
    let BeginFlush::Started(snap) = sched.begin_flush(&buf) else {
        panic!("expected a flush to start");
    };

    edit(&mut sched, &mut buf, 1, 1, dec!(3200));
    edit(&mut sched, &mut buf, 2, 1, dec!(1000));
    assert_eq!(sched.state(), SyncState::Flushing);

    let report = sched.complete_flush(&snap, Ok(()), &mut buf).unwrap();
    assert_eq!(report.cleared, 0);
    assert_eq!(report.remaining, 2);
    assert_eq!(buf.get(1, m(1)).unwrap().amount, dec!(3200));
    assert_eq!(sched.state(), SyncState::Armed);
    assert_eq!(sched.deadline(), Some(clock.now() + SETTLE));
}

#[test]
fn test_edits_during_flight_survive_failure() {
    let (_clock, mut sched, mut buf, _) = setup();
    edit(&mut sched, &mut buf, 1, 1, dec!(3000));
    let BeginFlush::Started(snap) = sched.begin_flush(&buf) else {
        panic!("expected a flush to start");
    };
    edit(&mut sched, &mut buf, 2, 1, dec!(1000));

    let failure = Err(FlushError::Store(StoreError::Unavailable("offline".into())));
    assert!(sched.complete_flush(&snap, failure, &mut buf).is_err());
    assert_eq!(buf.len(), 2);
}

#[test]
fn test_queued_request_runs_right_after() {
    let (clock, mut sched, mut buf, mut store) = setup();
    edit(&mut sched, &mut buf, 1, 1, dec!(3000));
    let BeginFlush::Started(snap) = sched.begin_flush(&buf) else {
        panic!("expected a flush to start");
    };
    edit(&mut sched, &mut buf, 2, 1, dec!(1000));
    assert!(sched.flush_now(&mut buf, &mut store).is_none());

    sched.complete_flush(&snap, Ok(()), &mut buf).unwrap();
    assert_eq!(sched.deadline(), Some(clock.now()));
    assert!(sched.is_due());

    let report = sched.tick(&mut buf, &mut store).unwrap().unwrap();
    assert_eq!(report.written, 1);
    assert!(buf.is_empty());
}

// ── Listeners ─────────────────────────────────────────────────

#[test]
fn test_listeners_see_every_transition() {
    let (clock, mut sched, mut buf, mut store) = setup();
    let seen: Rc<RefCell<Vec<SyncState>>> = Rc::default();
    let sink = Rc::clone(&seen);
    sched.on_state_change(move |status| sink.borrow_mut().push(status.state));

    edit(&mut sched, &mut buf, 1, 1, dec!(3000));
    clock.advance(SETTLE);
    sched.tick(&mut buf, &mut store).unwrap().unwrap();

    assert_eq!(
        *seen.borrow(),
        vec![SyncState::Armed, SyncState::Flushing, SyncState::Idle]
    );
}

#[test]
fn test_listener_sees_error_then_recovery() {
    let (clock, mut sched, mut buf, mut store) = setup();
    let errors: Rc<RefCell<Vec<Option<String>>>> = Rc::default();
    let sink = Rc::clone(&errors);
    sched.on_state_change(move |status| sink.borrow_mut().push(status.last_error.clone()));

    store.fail_writes = 1;
    edit(&mut sched, &mut buf, 1, 1, dec!(3000));
    clock.advance(SETTLE);
    let _ = sched.tick(&mut buf, &mut store);
    clock.advance(SETTLE);
    let _ = sched.tick(&mut buf, &mut store);

    let errors = errors.borrow();
    assert!(errors.iter().any(Option::is_some));
    assert_eq!(errors.last(), Some(&None));
}

#[test]
fn test_reset_forgets_error_and_timer() {
    let (clock, mut sched, mut buf, mut store) = setup();
    store.fail_writes = 1;
    edit(&mut sched, &mut buf, 1, 1, dec!(3000));
    clock.advance(SETTLE);
    let _ = sched.tick(&mut buf, &mut store);

    buf.discard();
    sched.reset();
    assert_eq!(
        sched.status(),
        SyncStatus {
            state: SyncState::Idle,
            pending_count: 0,
            last_error: None,
        }
    );
    assert!(!sched.is_due());
}
