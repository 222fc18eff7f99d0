//! Property Tests
//!
//! Saved histories come back byte-identical and in order, for any payloads,
//! any batch split and either layout.

use crate::*;
use proptest::prelude::*;

fn layout_strategy() -> impl Strategy<Value = KeyLayout> {
    prop_oneof![Just(KeyLayout::Decimal), Just(KeyLayout::Ordered)]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn prop_fetch_returns_saved_history(
        layout in layout_strategy(),
        id in "[a-z0-9:_-]{1,12}",
        payloads in prop::collection::vec(prop::collection::vec(any::<u8>(), 0..32), 1..24),
        batch in 1usize..6,
    ) {
        let store = create_event_store_with_layout(layout);
        let expected: Vec<EventRecord> = payloads
            .into_iter()
            .enumerate()
            .map(|(i, data)| EventRecord::new(i as u64 + 1, data))
            .collect();

        for chunk in expected.chunks(batch) {
            store.save(&id, chunk).unwrap();
        }

        prop_assert_eq!(store.fetch(&id, 0).unwrap(), expected.clone());
        prop_assert_eq!(store.current_version(&id).unwrap(), Some(expected.len() as u64));
    }

    #[test]
    fn prop_bounded_fetch_is_prefix(
        layout in layout_strategy(),
        count in 1u64..30,
        bound in 0u64..40,
    ) {
        let store = create_event_store_with_layout(layout);
        store.save("agg", &records("e", 1, count)).unwrap();

        let history = store.fetch("agg", bound).unwrap();

        let effective = if bound == 0 || bound > count { count } else { bound };
        prop_assert_eq!(history, records("e", 1, effective));
    }

    #[test]
    fn prop_overlap_always_rejected(
        count in 1u64..20,
        retry_at in 0u64..20,
    ) {
        let store = create_event_store();
        store.save("agg", &records("e", 1, count)).unwrap();

        let result = store.save("agg", &records("again", retry_at, retry_at));

        if retry_at <= count {
            prop_assert!(result.unwrap_err().is_overlapping_version());
            prop_assert_eq!(store.current_version("agg").unwrap(), Some(count));
        } else {
            prop_assert!(result.is_ok());
            prop_assert_eq!(store.current_version("agg").unwrap(), Some(retry_at));
        }
    }
}
