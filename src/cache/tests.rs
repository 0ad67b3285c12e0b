//! Tests for the cache state machine

use super::*;
use chrono::{Duration, TimeZone, Utc};
use test_case::test_case;

fn t0() -> chrono::DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()
}

#[test]
fn test_unsaved_never_decays() {
    let tracker = CacheTracker::unsaved();
    let policy = CachePolicy::always_stale();
    assert_eq!(tracker.state(&policy, t0()), CacheState::Unsaved);
    assert!(!tracker.must_fetch(&policy, t0(), false));
    assert!(!tracker.is_remote());
}

#[test]
fn test_fresh_within_max_age() {
    let tracker = CacheTracker::fetched(t0(), false);
    let policy = CachePolicy::new(60);
    assert_eq!(
        tracker.state(&policy, t0() + Duration::seconds(59)),
        CacheState::Fresh(t0())
    );
    assert_eq!(tracker.state(&policy, t0() + Duration::seconds(60)), CacheState::Stale);
}

#[test]
fn test_zero_max_age_is_immediately_stale() {
    let tracker = CacheTracker::fetched(t0(), false);
    assert_eq!(tracker.state(&CachePolicy::always_stale(), t0()), CacheState::Stale);
}

#[test_case(0 ; "no time")]
#[test_case(86_400 ; "one day")]
#[test_case(10 * 365 * 86_400 ; "ten years")]
fn test_negative_max_age_never_expires(elapsed: i64) {
    let tracker = CacheTracker::fetched(t0(), false);
    let now = t0() + Duration::seconds(elapsed);
    assert_eq!(
        tracker.state(&CachePolicy::never_expire(), now),
        CacheState::Fresh(t0())
    );
}

#[test]
fn test_partial_state_and_materialization() {
    let tracker = CacheTracker::fetched(t0(), true);
    let policy = CachePolicy::default();
    assert_eq!(tracker.state(&policy, t0()), CacheState::Partial(t0()));
    assert!(!tracker.must_fetch(&policy, t0(), true));
    assert!(tracker.must_fetch(&policy, t0(), false));
}

#[test]
fn test_partial_decays_to_stale() {
    let tracker = CacheTracker::fetched(t0(), true);
    let policy = CachePolicy::new(10);
    assert!(tracker
        .state(&policy, t0() + Duration::seconds(10))
        .is_stale());
}

#[test]
fn test_stale_must_fetch_unless_dirty() {
    let mut tracker = CacheTracker::stale();
    let policy = CachePolicy::default();
    assert!(tracker.must_fetch(&policy, t0(), true));
    tracker.mark_dirty();
    assert!(tracker.is_dirty());
    assert!(!tracker.must_fetch(&policy, t0(), true));
}

#[test]
fn test_unfetched_edits_fetch_missing_fields() {
    let mut tracker = CacheTracker::unfetched();
    let policy = CachePolicy::never_expire();
    assert!(tracker.state(&policy, t0()).is_stale());
    assert!(tracker.is_unfetched());

    tracker.mark_dirty();
    assert!(!tracker.must_fetch(&policy, t0(), true));
    assert!(tracker.must_fetch(&policy, t0(), false));

    tracker.mark_fetched(t0(), false);
    assert!(!tracker.is_unfetched());
    tracker.mark_dirty();
    assert!(!tracker.must_fetch(&policy, t0(), false));
}

#[test]
fn test_mark_fetched_clears_dirty() {
    let mut tracker = CacheTracker::stale();
    tracker.mark_dirty();
    tracker.mark_fetched(t0(), false);
    assert!(!tracker.is_dirty());
    assert!(tracker.state(&CachePolicy::default(), t0()).is_fresh());
}

#[test]
fn test_invalidate() {
    let mut tracker = CacheTracker::fetched(t0(), false);
    tracker.invalidate();
    assert_eq!(tracker.state(&CachePolicy::never_expire(), t0()), CacheState::Stale);

    let mut local = CacheTracker::unsaved();
    local.invalidate();
    assert!(local.state(&CachePolicy::default(), t0()).is_unsaved());
}

#[test]
fn test_mark_unsaved() {
    let mut tracker = CacheTracker::fetched(t0(), false);
    tracker.mark_unsaved();
    assert!(!tracker.is_remote());
    assert!(tracker.state(&CachePolicy::default(), t0()).is_unsaved());
}

#[test]
fn test_fetched_at() {
    assert_eq!(CacheState::Fresh(t0()).fetched_at(), Some(t0()));
    assert_eq!(CacheState::Partial(t0()).fetched_at(), Some(t0()));
    assert_eq!(CacheState::Stale.fetched_at(), None);
    assert_eq!(CacheState::Unsaved.to_string(), "unsaved");
}
