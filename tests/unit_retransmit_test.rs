use std::time::{Duration, Instant};

use admind::messaging::retransmit::{Backoff, RetransmitScheduler};

#[test]
fn first_request_for_a_sender_always_triggers() {
    let mut sched = RetransmitScheduler::new();
    let now = Instant::now();
    assert!(sched.request(7, 10, now));
}

#[test]
fn overlapping_requests_within_the_window_coalesce() {
    // `§8` scenario 6: two receivers both miss sequence 10 from the same
    // sender within the coalescing window; only one retransmission fires.
    let mut sched = RetransmitScheduler::new();
    let now = Instant::now();
    assert!(sched.request(7, 10, now));
    assert!(!sched.request(7, 10, now + Duration::from_millis(50)));
    assert!(!sched.request(7, 12, now + Duration::from_millis(100)));
}

#[test]
fn a_lower_floor_within_the_window_still_triggers() {
    let mut sched = RetransmitScheduler::new();
    let now = Instant::now();
    assert!(sched.request(7, 10, now));
    assert!(sched.request(7, 5, now + Duration::from_millis(50)));
}

#[test]
fn a_request_after_the_window_closes_triggers_again() {
    let mut sched = RetransmitScheduler::new();
    let now = Instant::now();
    assert!(sched.request(7, 10, now));
    assert!(sched.request(7, 10, now + Duration::from_millis(500)));
}

#[test]
fn clearing_a_sender_forgets_its_pending_window() {
    let mut sched = RetransmitScheduler::new();
    let now = Instant::now();
    assert!(sched.request(7, 10, now));
    sched.clear(7);
    assert!(sched.request(7, 10, now + Duration::from_millis(50)));
}

#[test]
fn backoff_increases_multiplicatively_and_clamps_at_the_ceiling() {
    let mut b = Backoff::default();
    assert_eq!(b.duration(), Duration::from_millis(0));
    for _ in 0..10 {
        b.on_retransmit();
    }
    assert_eq!(b.duration(), Duration::from_millis(80));
}

#[test]
fn backoff_decreases_proportionally_on_success() {
    let mut b = Backoff::default();
    for _ in 0..10 {
        b.on_retransmit();
    }
    assert_eq!(b.duration(), Duration::from_millis(80));
    b.on_successful_send();
    assert_eq!(b.duration(), Duration::from_millis(60));
    b.on_successful_send();
    assert_eq!(b.duration(), Duration::from_millis(45));
}
