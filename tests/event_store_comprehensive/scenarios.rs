//! End-to-End Scenarios

use crate::*;
use eventvault::Error;

#[test]
fn test_user_registration_scenario() {
    let store = create_event_store();

    store
        .save(
            "u1",
            &[
                EventRecord::new(1, "created"),
                EventRecord::new(2, "email-set"),
            ],
        )
        .unwrap();

    assert_eq!(
        store.fetch("u1", 0).unwrap(),
        vec![
            EventRecord::new(1, "created"),
            EventRecord::new(2, "email-set"),
        ]
    );

    let err = store.save("u1", &[EventRecord::new(2, "dup")]).unwrap_err();
    assert!(matches!(
        err,
        Error::OverlappingVersion { ref aggregate_id, version: 2, .. } if aggregate_id == "u1"
    ));
}

#[test]
fn test_monotonic_append_scenario() {
    let store = create_event_store();
    store.save("id", &records("e", 1, 3)).unwrap();

    assert!(store
        .save("id", &records("x", 2, 4))
        .unwrap_err()
        .is_overlapping_version());
    store.save("id", &records("e", 4, 5)).unwrap();

    assert_eq!(store.fetch("id", 3).unwrap(), records("e", 1, 3));
    assert_eq!(store.fetch("id", 100).unwrap(), records("e", 1, 5));
}

#[test]
fn test_repository_retry_loop() {
    let store = create_event_store();
    store.save("cart", &records("e", 1, 2)).unwrap();

    // A repository that assumed version 1 is current
    let stale_next = 2;
    let err = store
        .save("cart", &[EventRecord::new(stale_next, "item-added")])
        .unwrap_err();
    assert!(err.is_retryable());

    // Re-read and retry with the corrected version
    let current = store.current_version("cart").unwrap().unwrap_or(0);
    store
        .save("cart", &[EventRecord::new(current + 1, "item-added")])
        .unwrap();

    let history = store.fetch("cart", 0).unwrap();
    assert_eq!(history.last().unwrap(), &EventRecord::new(3, "item-added"));
}

#[test]
fn test_point_in_time_replay() {
    let store = create_event_store();
    store.save("acct", &records("deposit", 1, 4)).unwrap();
    store.save("acct", &records("withdraw", 5, 6)).unwrap();

    let as_of_four = store.fetch("acct", 4).unwrap();
    assert!(as_of_four
        .iter()
        .all(|r| r.data.starts_with(b"deposit")));
    assert_eq!(as_of_four.len(), 4);
    assert_eq!(store.fetch("acct", 0).unwrap().len(), 6);
}
