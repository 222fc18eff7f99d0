//! Fetch Tests
//!
//! Bounds, clamping, missing versions and unknown aggregates.

use crate::*;

#[test]
fn test_fetch_unknown_aggregate_is_empty() {
    let store = create_event_store();

    assert!(store.fetch("never-seen", 0).unwrap().is_empty());
    assert!(store.fetch("never-seen", 42).unwrap().is_empty());
}

#[test]
fn test_fetch_zero_returns_everything() {
    let store = create_event_store();
    store.save("u1", &records("e", 1, 5)).unwrap();

    assert_eq!(store.fetch("u1", 0).unwrap(), records("e", 1, 5));
}

#[test]
fn test_fetch_bounded() {
    let store = create_event_store();
    store.save("u1", &records("e", 1, 5)).unwrap();

    assert_eq!(store.fetch("u1", 3).unwrap(), records("e", 1, 3));
    assert_eq!(store.fetch("u1", 1).unwrap(), records("e", 1, 1));
}

#[test]
fn test_fetch_above_current_clamps() {
    let store = create_event_store();
    store.save("u1", &records("e", 1, 5)).unwrap();

    assert_eq!(store.fetch("u1", 100).unwrap(), records("e", 1, 5));
    assert_eq!(store.fetch("u1", u64::MAX).unwrap(), records("e", 1, 5));
}

#[test]
fn test_fetch_at_current_is_complete() {
    let store = create_event_store();
    store.save("u1", &records("e", 1, 5)).unwrap();

    assert_eq!(store.fetch("u1", 5).unwrap(), records("e", 1, 5));
}

#[test]
fn test_fetch_is_ascending_past_nine() {
    let store = create_event_store();
    store.save("u1", &records("e", 1, 25)).unwrap();

    let history = store.fetch("u1", 0).unwrap();
    let versions: Vec<u64> = history.iter().map(|r| r.version).collect();

    assert_eq!(versions, (1..=25).collect::<Vec<_>>());
}

#[test]
fn test_fetch_skips_missing_versions() {
    let store = create_event_store();
    store.save("u1", &[EventRecord::new(2, "b")]).unwrap();
    store.save("u1", &[EventRecord::new(7, "g")]).unwrap();

    assert_eq!(
        store.fetch("u1", 0).unwrap(),
        vec![EventRecord::new(2, "b"), EventRecord::new(7, "g")]
    );
    assert_eq!(store.fetch("u1", 6).unwrap(), vec![EventRecord::new(2, "b")]);
    assert!(store.fetch("u1", 1).unwrap().is_empty());
}

#[test]
fn test_fetch_does_not_mix_aggregates() {
    let store = create_event_store();
    store.save("u1", &records("one", 1, 3)).unwrap();
    store.save("u11", &records("eleven", 1, 3)).unwrap();
    store.save("u", &records("short", 1, 3)).unwrap();

    assert_eq!(store.fetch("u1", 0).unwrap(), records("one", 1, 3));
    assert_eq!(store.fetch("u11", 0).unwrap(), records("eleven", 1, 3));
    assert_eq!(store.fetch("u", 0).unwrap(), records("short", 1, 3));
}

#[test]
fn test_fetch_does_not_write() {
    let store = create_event_store();
    store.save("u1", &records("e", 1, 3)).unwrap();
    let metrics_before = store.store().metrics();

    store.fetch("u1", 0).unwrap();
    store.fetch("unknown", 0).unwrap();

    assert_eq!(store.store().metrics(), metrics_before);
}

#[test]
fn test_current_version_tracks_saves() {
    let store = create_event_store();
    assert_eq!(store.current_version("u1").unwrap(), None);

    store.save("u1", &records("e", 1, 2)).unwrap();
    assert_eq!(store.current_version("u1").unwrap(), Some(2));

    store.save("u1", &records("e", 3, 9)).unwrap();
    assert_eq!(store.current_version("u1").unwrap(), Some(9));
}
