use limits::{
    clock::{Clock, FakeRelativeClock},
    MemBucket, Quota,
};
use nonzero_ext::nonzero;
use std::time::Duration;

const KEYS: &[&str] = &["A", "B", ""];

fn quota() -> Quota {
    Quota::per_minute(nonzero!(5u32)).allow_burst(nonzero!(10u32))
}

#[test]
fn accepts_first_request() {
    let clock = FakeRelativeClock::default();
    let lb = MemBucket::with_clock(nonzero!(100usize), quota(), clock);
    for key in KEYS {
        let decision = lb.consume(key, 1);
        assert!(decision.is_admitted(), "key {:?}", key);
        assert_eq!(decision.remaining(), 9, "key {:?}", key);
    }
}

#[test]
fn denial_leaves_tokens_alone() {
    let clock = FakeRelativeClock::default();
    let lb = MemBucket::with_clock(nonzero!(100usize), quota(), clock);

    let (remaining, wait, admitted) = lb.consume(&"A", 3).into_parts();
    assert_eq!((remaining, admitted), (7, true));
    // The wait on a positive decision is the time to refill an empty bucket:
    assert_eq!(wait, 2);

    let decision = lb.consume(&"A", 10);
    assert_eq!((decision.remaining(), decision.is_admitted()), (7, false));
    assert_eq!(decision.wait(), 0);
    assert_eq!(decision.wait_time(), Duration::from_secs(36));

    // Asking again doesn't change anything either:
    assert_eq!(lb.consume(&"A", 10).into_parts(), (7, 0, false));
    assert_eq!(lb.consume(&"A", 7).into_parts(), (0, 2, true));
}

#[test]
fn reset_fills_up() {
    let clock = FakeRelativeClock::default();
    let lb = MemBucket::with_clock(nonzero!(100usize), quota(), clock);

    assert!(lb.consume(&"A", 8).is_admitted());
    lb.reset(&"A");
    let decision = lb.consume(&"A", 10);
    assert!(decision.is_admitted());
    assert_eq!(decision.remaining(), 0);
}

#[test]
fn reset_is_idempotent() {
    let clock = FakeRelativeClock::default();
    let lb = MemBucket::with_clock(nonzero!(100usize), quota(), clock);

    assert!(lb.consume(&"A", 10).is_admitted());
    lb.reset(&"A");
    lb.reset(&"A");
    assert_eq!(lb.consume(&"A", 0).remaining(), 10);
}

#[test]
fn reset_of_unknown_key_is_a_noop() {
    let clock = FakeRelativeClock::default();
    let lb = MemBucket::with_clock(nonzero!(100usize), quota(), clock);

    lb.reset(&"nobody");
    assert!(lb.is_empty());
    assert_eq!(lb.consume(&"nobody", 1).remaining(), 9);
}

#[test]
fn refills_after_a_minute() {
    let clock = FakeRelativeClock::default();
    let lb = MemBucket::with_clock(
        nonzero!(100usize),
        Quota::per_minute(nonzero!(60u32)).allow_burst(nonzero!(10u32)),
        clock.clone(),
    );

    assert!(lb.consume(&"A", 10).is_admitted());
    assert!(!lb.consume(&"A", 1).is_admitted(), "Now: {:?}", clock.now());

    clock.advance(Duration::from_secs(60));
    assert_eq!(lb.consume(&"A", 10).into_parts(), (0, 0, true));
}

#[test]
fn refill_is_proportional_to_elapsed_time() {
    let clock = FakeRelativeClock::default();
    let lb = MemBucket::with_clock(nonzero!(100usize), quota(), clock.clone());

    assert!(lb.consume(&"A", 10).is_admitted());
    // One token every 12 seconds:
    clock.advance(Duration::from_secs(30));
    assert_eq!(lb.consume(&"A", 0).remaining(), 2);
    clock.advance(Duration::from_secs(24));
    assert_eq!(lb.consume(&"A", 0).remaining(), 4);
    clock.advance(Duration::from_secs(3600));
    assert_eq!(lb.consume(&"A", 0).remaining(), 10);
}

#[test]
fn no_refill_without_elapsed_time() {
    let clock = FakeRelativeClock::default();
    let lb = MemBucket::with_clock(nonzero!(100usize), quota(), clock);

    assert!(lb.consume(&"A", 4).is_admitted());
    for _ in 0..10 {
        assert_eq!(lb.consume(&"A", 0).remaining(), 6);
    }
}

#[test]
fn frequent_polling_starves_refill() {
    let clock = FakeRelativeClock::default();
    let lb = MemBucket::with_clock(nonzero!(100usize), quota(), clock.clone());
    let s = Duration::from_secs(1);

    assert!(lb.consume(&"A", 10).is_admitted());
    // A token takes 12s to accrue, but every access starts the clock over:
    for _ in 0..60 {
        clock.advance(s * 10);
        assert!(!lb.consume(&"A", 1).is_admitted(), "Now: {:?}", clock.now());
    }
    clock.advance(s * 12);
    assert!(lb.consume(&"A", 1).is_admitted());
}

#[test]
fn never_admits_more_than_capacity() {
    let clock = FakeRelativeClock::default();
    let lb = MemBucket::with_clock(nonzero!(100usize), quota(), clock.clone());

    let decision = lb.consume(&"A", 11);
    assert!(!decision.is_admitted());
    assert_eq!(decision.remaining(), 10);

    clock.advance(Duration::from_secs(24 * 60 * 60));
    assert!(!lb.consume(&"A", 11).is_admitted());
}

#[test]
fn correct_wait_time() {
    let clock = FakeRelativeClock::default();
    let lb = MemBucket::with_clock(nonzero!(100usize), quota(), clock.clone());
    let mut conforming = 0;
    for _i in 0..40 {
        let decision = lb.consume(&"A", 3);
        if decision.is_admitted() {
            conforming += 1;
        } else {
            clock.advance(decision.wait_time());
            assert!(lb.consume(&"A", 3).is_admitted(), "{}", decision);
            conforming += 1;
        }
    }
    assert_eq!(40, conforming);
}

#[test]
fn eviction_forgets_history() {
    let clock = FakeRelativeClock::default();
    let lb = MemBucket::with_clock(nonzero!(1usize), quota(), clock);

    assert_eq!(lb.consume(&"A", 10).remaining(), 0);
    assert_eq!(lb.consume(&"B", 1).remaining(), 9);
    // "A" was evicted to make room for "B" and starts over:
    assert_eq!(lb.consume(&"A", 1).remaining(), 9);
    assert_eq!(lb.len(), 1);
}

#[test]
fn eviction_picks_least_recently_used() {
    let clock = FakeRelativeClock::default();
    let lb = MemBucket::with_clock(nonzero!(2usize), quota(), clock);

    assert!(lb.consume(&"A", 10).is_admitted());
    assert!(lb.consume(&"B", 10).is_admitted());
    // Touch "A" so that "B" is the least recently used:
    assert!(!lb.consume(&"A", 1).is_admitted());
    assert!(lb.consume(&"C", 1).is_admitted());

    assert!(!lb.consume(&"A", 1).is_admitted());
    assert_eq!(lb.consume(&"B", 0).remaining(), 10);
}

#[test]
fn reset_counts_as_use() {
    let clock = FakeRelativeClock::default();
    let lb = MemBucket::with_clock(nonzero!(2usize), quota(), clock);

    assert!(lb.consume(&"A", 5).is_admitted());
    assert!(lb.consume(&"B", 5).is_admitted());
    lb.reset(&"A");
    assert!(lb.consume(&"C", 1).is_admitted());
    // "B" was evicted, "A" kept its (reset) bucket:
    assert_eq!(lb.consume(&"A", 0).remaining(), 10);
    assert_eq!(lb.consume(&"C", 0).remaining(), 9);
}

#[test]
fn string_keys() {
    let lb: MemBucket = MemBucket::try_new(100, 10, 5).unwrap();
    let key = "203.0.113.7".to_string();
    assert_eq!(lb.consume(&key, 3).into_parts(), (7, 2, true));
    assert!(!lb.consume(&key, 10).is_admitted());
}
