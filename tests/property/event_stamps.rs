//! Event stamps cannot be supplied by callers.

use chrono::{TimeZone, Utc};
use footprints::event::EventBuilder;
use footprints::host::{FixedClock, SequentialIdGenerator};
use footprints::EventType;
use proptest::prelude::*;
use serde_json::{Map, Value};
use std::sync::Arc;

fn properties() -> impl Strategy<Value = Map<String, Value>> {
    let key = prop_oneof![
        Just("eventType".to_string()),
        Just("eventId".to_string()),
        Just("eventTime".to_string()),
        "[a-z]{1,8}",
    ];
    prop::collection::btree_map(key, "[a-z0-9]{0,6}", 0..8)
        .prop_map(|entries| entries.into_iter().map(|(k, v)| (k, Value::String(v))).collect())
}

/// Test that stamp fields always come from the builder, whatever the caller passes
#[test]
fn test_stamp_fields_are_immutable_property() {
    let mut runner = proptest::test_runner::TestRunner::default();

    runner
        .run(&properties(), |props| {
            let builder = EventBuilder::new(
                Arc::new(FixedClock(Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap())),
                Arc::new(SequentialIdGenerator::new("p")),
            );
            let event = builder.build(EventType::Track, props.clone());
            let doc = event.to_document();

            prop_assert_eq!(&doc["eventType"], "track");
            prop_assert_eq!(&doc["eventId"], "p-1");
            prop_assert_eq!(&doc["eventTime"], "2024-01-02T03:04:05.000Z");
            for (key, value) in &props {
                if !key.starts_with("event") {
                    prop_assert_eq!(&doc[key.as_str()], value);
                }
            }
            Ok(())
        })
        .unwrap();
}
