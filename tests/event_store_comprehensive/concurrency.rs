//! Concurrency Tests
//!
//! Racing saves never lose or duplicate a version; readers only ever see
//! whole batches.

use crate::*;
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;

const THREADS: usize = 4;
const SAVES_PER_THREAD: usize = 20;

/// Append one event at `current + 1`, retrying on retryable errors
fn append_with_retry(store: &EventStore<Database>, aggregate_id: &str, payload: String) -> u64 {
    loop {
        let next = store.current_version(aggregate_id).unwrap().unwrap_or(0) + 1;
        match store.save(aggregate_id, &[EventRecord::new(next, payload.clone())]) {
            Ok(()) => return next,
            Err(e) if e.is_retryable() => continue,
            Err(e) => panic!("unexpected save error: {}", e),
        }
    }
}

#[test]
fn test_racing_saves_on_one_aggregate() {
    let store = create_event_store();

    let handles: Vec<_> = (0..THREADS)
        .map(|t| {
            let store = store.clone();
            thread::spawn(move || {
                (0..SAVES_PER_THREAD)
                    .map(|i| append_with_retry(&store, "shared", format!("t{}-{}", t, i)))
                    .collect::<Vec<_>>()
            })
        })
        .collect();

    let mut won = HashSet::new();
    for h in handles {
        for version in h.join().unwrap() {
            assert!(won.insert(version), "version {} saved twice", version);
        }
    }

    let total = (THREADS * SAVES_PER_THREAD) as u64;
    let history = store.fetch("shared", 0).unwrap();
    let versions: Vec<u64> = history.iter().map(|r| r.version).collect();
    assert_eq!(versions, (1..=total).collect::<Vec<_>>());
    assert_eq!(won.len() as u64, total);
    assert_eq!(store.current_version("shared").unwrap(), Some(total));
}

#[test]
fn test_losing_save_is_rejected_not_merged() {
    let store = create_event_store();
    store.save("u1", &records("e", 1, 1)).unwrap();

    // Both writers believe the current version is 1
    let handles: Vec<_> = ["left", "right"]
        .into_iter()
        .map(|name| {
            let store = store.clone();
            thread::spawn(move || store.save("u1", &[EventRecord::new(2, name)]))
        })
        .collect();
    let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();

    let winners = results.iter().filter(|r| r.is_ok()).count();
    assert_eq!(winners, 1);
    for err in results.iter().filter_map(|r| r.as_ref().err()) {
        assert!(err.is_retryable(), "loser got {:?}", err);
    }
    assert_eq!(store.fetch("u1", 0).unwrap().len(), 2);
}

#[test]
fn test_distinct_aggregates_never_conflict() {
    let store = create_event_store();

    let handles: Vec<_> = (0..THREADS)
        .map(|t| {
            let store = store.clone();
            thread::spawn(move || {
                let id = format!("agg-{}", t);
                for v in 1..=SAVES_PER_THREAD as u64 {
                    store.save(&id, &[EventRecord::new(v, "x")]).unwrap();
                }
            })
        })
        .collect();
    for h in handles {
        h.join().unwrap();
    }

    for t in 0..THREADS {
        let id = format!("agg-{}", t);
        assert_eq!(
            store.current_version(&id).unwrap(),
            Some(SAVES_PER_THREAD as u64)
        );
    }
}

#[test]
fn test_readers_see_whole_batches() {
    const BATCH: u64 = 3;
    const BATCHES: u64 = 30;

    let store = create_event_store();
    let done = Arc::new(AtomicBool::new(false));

    let readers: Vec<_> = (0..2)
        .map(|_| {
            let store = store.clone();
            let done = Arc::clone(&done);
            thread::spawn(move || {
                while !done.load(Ordering::Acquire) {
                    let history = store.fetch("batched", 0).unwrap();
                    assert_eq!(history.len() as u64 % BATCH, 0, "partial batch visible");
                    for (i, record) in history.iter().enumerate() {
                        assert_eq!(record.version, i as u64 + 1);
                    }
                }
            })
        })
        .collect();

    for b in 0..BATCHES {
        let first = b * BATCH + 1;
        store
            .save("batched", &records("e", first, first + BATCH - 1))
            .unwrap();
    }
    done.store(true, Ordering::Release);

    for r in readers {
        r.join().unwrap();
    }
    assert_eq!(store.fetch("batched", 0).unwrap().len() as u64, BATCH * BATCHES);
}

#[test]
fn test_open_reader_keeps_its_view_across_saves() {
    let db = create_inmemory_db();
    let store = EventStore::new(Arc::clone(&db)).unwrap();
    store.save("agg", &records("e", 1, 1)).unwrap();

    let mut reader = db.begin_read().unwrap();
    for v in 2..=50 {
        store.save("agg", &records("e", v, v)).unwrap();
    }

    assert_eq!(reader.get("ids", b"agg").unwrap(), Some(b"1".to_vec()));
    drop(reader);

    store.save("agg", &records("e", 51, 51)).unwrap();
    assert_eq!(store.current_version("agg").unwrap(), Some(51));
    assert_eq!(store.fetch("agg", 0).unwrap(), records("e", 1, 51));
}
