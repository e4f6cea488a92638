//! Context store merges: last write wins, untouched keys survive.

use footprints::ContextStore;
use proptest::prelude::*;
use serde_json::{Map, Value};

fn partial() -> impl Strategy<Value = Map<String, Value>> {
    prop::collection::btree_map("[a-e]", any::<i64>(), 0..5).prop_map(|entries| {
        entries
            .into_iter()
            .map(|(k, v)| (k, Value::from(v)))
            .collect()
    })
}

/// Test that the latest write for each key wins across any sequence of merges
#[test]
fn test_last_write_wins_property() {
    let mut runner = proptest::test_runner::TestRunner::default();

    runner
        .run(&prop::collection::vec(partial(), 0..8), |partials| {
            let mut store = ContextStore::new();
            let mut expected = Map::new();
            for partial in &partials {
                store.merge(partial.clone());
                for (key, value) in partial {
                    expected.insert(key.clone(), value.clone());
                }
            }

            prop_assert_eq!(store.snapshot(), expected);
            Ok(())
        })
        .unwrap();
}

/// Test that a snapshot is unaffected by later merges
#[test]
fn test_snapshot_isolation_property() {
    let mut runner = proptest::test_runner::TestRunner::default();

    runner
        .run(&(partial(), partial()), |(first, second)| {
            let mut store = ContextStore::new();
            store.merge(first.clone());
            let snapshot = store.snapshot();
            store.merge(second);

            prop_assert_eq!(snapshot, first);
            Ok(())
        })
        .unwrap();
}
