//! Key Layout Tests
//!
//! Decimal and ordered layouts store different keys but return the same
//! histories.

use crate::*;

#[test]
fn test_layouts_return_identical_histories() {
    let decimal = create_event_store_with_layout(KeyLayout::Decimal);
    let ordered = create_event_store_with_layout(KeyLayout::Ordered);

    for store in [&decimal, &ordered] {
        store.save("u1", &records("e", 1, 12)).unwrap();
        store.save("u1", &[EventRecord::new(20, "late")]).unwrap();
        store.save("u12", &records("other", 1, 4)).unwrap();
    }

    for bound in [0, 1, 9, 10, 12, 15, 20, 100] {
        assert_eq!(
            decimal.fetch("u1", bound).unwrap(),
            ordered.fetch("u1", bound).unwrap(),
            "histories differ at bound {}",
            bound
        );
    }
    assert_eq!(
        decimal.fetch("u12", 0).unwrap(),
        ordered.fetch("u12", 0).unwrap()
    );
}

#[test]
fn test_decimal_keys_in_event_namespace() {
    let store = create_event_store_with_layout(KeyLayout::Decimal);
    store.save("u1", &records("e", 9, 10)).unwrap();

    let mut txn = store.store().begin_read().unwrap();
    let keys: Vec<Vec<u8>> = txn
        .scan_prefix("events", b"")
        .unwrap()
        .into_iter()
        .map(|(k, _)| k)
        .collect();

    // Lexicographic order puts "10" before "9"
    assert_eq!(keys, vec![b"10:u1".to_vec(), b"9:u1".to_vec()]);
}

#[test]
fn test_ordered_keys_group_by_aggregate() {
    let store = create_event_store_with_layout(KeyLayout::Ordered);
    store.save("b", &records("b", 1, 2)).unwrap();
    store.save("a", &records("a", 1, 11)).unwrap();

    let mut txn = store.store().begin_read().unwrap();
    let rows = txn.scan_prefix("events", b"").unwrap();

    let payloads: Vec<Vec<u8>> = rows.into_iter().map(|(_, v)| v).collect();
    let mut expected: Vec<Vec<u8>> = records("a", 1, 11).into_iter().map(|r| r.data).collect();
    expected.extend(records("b", 1, 2).into_iter().map(|r| r.data));
    assert_eq!(payloads, expected);
}

#[test]
fn test_ordered_prefix_aggregates_stay_apart() {
    let store = create_event_store_with_layout(KeyLayout::Ordered);
    store.save("ab", &records("ab", 1, 2)).unwrap();
    store.save("abc", &records("abc", 1, 3)).unwrap();
    store.save("a", &records("a", 1, 1)).unwrap();

    assert_eq!(store.fetch("ab", 0).unwrap(), records("ab", 1, 2));
    assert_eq!(store.fetch("abc", 0).unwrap(), records("abc", 1, 3));
    assert_eq!(store.fetch("a", 0).unwrap(), records("a", 1, 1));
}

#[test]
fn test_ordered_fetch_with_large_versions() {
    let store = create_event_store_with_layout(KeyLayout::Ordered);
    let big = 1u64 << 40;
    store
        .save(
            "u1",
            &[EventRecord::new(1, "first"), EventRecord::new(big, "far")],
        )
        .unwrap();

    assert_eq!(
        store.fetch("u1", 0).unwrap(),
        vec![EventRecord::new(1, "first"), EventRecord::new(big, "far")]
    );
    assert_eq!(
        store.fetch("u1", big - 1).unwrap(),
        vec![EventRecord::new(1, "first")]
    );
}

#[test]
fn test_layout_from_toml_config() {
    let config = EventStoreConfig::from_toml_str("key_layout = \"ordered\"").unwrap();
    let store = EventStore::with_config(create_inmemory_db(), config).unwrap();

    store.save("u1", &records("e", 1, 2)).unwrap();

    assert_eq!(store.config().key_layout, KeyLayout::Ordered);
    assert_eq!(store.fetch("u1", 0).unwrap(), records("e", 1, 2));
}

#[test]
fn test_unicode_aggregate_ids() {
    for layout in all_layouts() {
        let store = create_event_store_with_layout(layout);
        store.save("ユーザー:7", &records("e", 1, 3)).unwrap();
        store.save("user:7", &records("f", 1, 1)).unwrap();

        assert_eq!(store.fetch("ユーザー:7", 0).unwrap(), records("e", 1, 3));
        assert_eq!(store.fetch("user:7", 0).unwrap(), records("f", 1, 1));
    }
}
