//! Atomicity Tests
//!
//! A save that fails partway leaves neither events nor the version index.

use crate::*;
use eventvault::Error;

fn faulty_event_store(layout: KeyLayout) -> (Arc<FaultyStore>, EventStore<FaultyStore>) {
    let faulty = Arc::new(FaultyStore::new());
    let store = EventStore::with_config(
        Arc::clone(&faulty),
        EventStoreConfig::default().with_key_layout(layout),
    )
    .unwrap();
    (faulty, store)
}

fn assert_nothing_visible(store: &EventStore<FaultyStore>, aggregate_id: &str) {
    assert_eq!(store.current_version(aggregate_id).unwrap(), None);
    assert!(store.fetch(aggregate_id, 0).unwrap().is_empty());
    for namespace in ["ids", "events"] {
        let mut txn = store.store().begin_read().unwrap();
        assert!(
            txn.scan_prefix(namespace, b"").unwrap().is_empty(),
            "namespace {} not empty",
            namespace
        );
    }
}

#[test]
fn test_failed_event_put_persists_nothing() {
    for layout in all_layouts() {
        let (faulty, store) = faulty_event_store(layout);
        faulty.set_plan(FaultPlan {
            fail_put: Some(2),
            ..FaultPlan::default()
        });

        let err = store.save("u1", &records("e", 1, 3)).unwrap_err();

        assert!(matches!(err, Error::Store(StoreError::Io(_))));
        assert_nothing_visible(&store, "u1");
    }
}

#[test]
fn test_failed_index_put_persists_nothing() {
    let (faulty, store) = faulty_event_store(KeyLayout::Decimal);
    // Three event puts succeed, the index put fails
    faulty.set_plan(FaultPlan {
        fail_put: Some(4),
        ..FaultPlan::default()
    });

    store.save("u1", &records("e", 1, 3)).unwrap_err();

    assert_nothing_visible(&store, "u1");
}

#[test]
fn test_failed_commit_persists_nothing() {
    for layout in all_layouts() {
        let (faulty, store) = faulty_event_store(layout);
        faulty.set_plan(FaultPlan {
            fail_commit: true,
            ..FaultPlan::default()
        });

        let err = store.save("u1", &records("e", 1, 5)).unwrap_err();

        assert!(matches!(err, Error::Store(_)));
        assert_nothing_visible(&store, "u1");
    }
}

#[test]
fn test_failure_does_not_disturb_existing_history() {
    let (faulty, store) = faulty_event_store(KeyLayout::Decimal);
    store.save("u1", &records("e", 1, 3)).unwrap();

    faulty.set_plan(FaultPlan {
        fail_put: Some(2),
        ..FaultPlan::default()
    });
    store.save("u1", &records("e", 4, 6)).unwrap_err();

    assert_eq!(store.current_version("u1").unwrap(), Some(3));
    assert_eq!(store.fetch("u1", 0).unwrap(), records("e", 1, 3));
}

#[test]
fn test_save_succeeds_after_failure() {
    let (faulty, store) = faulty_event_store(KeyLayout::Decimal);
    faulty.set_plan(FaultPlan {
        fail_commit: true,
        ..FaultPlan::default()
    });
    store.save("u1", &records("e", 1, 2)).unwrap_err();

    faulty.heal();
    store.save("u1", &records("e", 1, 2)).unwrap();

    assert_eq!(store.fetch("u1", 0).unwrap(), records("e", 1, 2));
}

#[test]
fn test_failed_transactions_are_rolled_back() {
    let (faulty, store) = faulty_event_store(KeyLayout::Decimal);
    faulty.set_plan(FaultPlan {
        fail_put: Some(1),
        ..FaultPlan::default()
    });

    store.save("u1", &records("e", 1, 1)).unwrap_err();

    let metrics = faulty.inner().metrics();
    assert_eq!(metrics.transactions_committed, 0);
    assert_eq!(metrics.transactions_aborted, 1);
}

#[test]
fn test_namespace_failure_is_initialization_error() {
    let faulty = Arc::new(FaultyStore::new());
    faulty.set_plan(FaultPlan {
        fail_namespace: true,
        ..FaultPlan::default()
    });

    let err = EventStore::new(Arc::clone(&faulty)).unwrap_err();

    match err {
        Error::Initialization { namespace, source } => {
            assert_eq!(namespace, "ids");
            assert!(matches!(source, StoreError::Io(_)));
        }
        other => panic!("Expected Initialization, got {:?}", other),
    }
}
