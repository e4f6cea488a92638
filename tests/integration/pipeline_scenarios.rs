//! End-to-end scenarios through the public entry surface.

use super::test_utils::{config, options, start, Callbacks, RecordingTransport, FLUSH};
use footprints::Footprints;
use serde_json::{json, Map, Value};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

fn props(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        _ => Map::new(),
    }
}

#[tokio::test]
async fn context_update_then_page_view_sends_one_enriched_request() {
    let (footprints, transport, callbacks) = start(config());

    footprints.push("context", vec![json!({ "userId": 7 })]);
    footprints.push("pageView", vec![]);
    footprints.flush(FLUSH).await.unwrap();

    let requests = transport.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0]["userId"], 7);
    assert_eq!(requests[0]["eventType"], "pageView");
    assert_eq!(requests[0]["path"], "/pricing");
    assert_eq!(requests[0]["title"], "Pricing");
    assert_eq!(requests[0]["eventTime"], "2024-03-01T12:00:00.000Z");
    assert_eq!(requests[0]["pageTime"], "2024-03-01T12:00:00.000Z");
    assert_eq!(callbacks.successes(), 1);
    assert_eq!(callbacks.errors(), 0);
    footprints.shutdown();
}

#[tokio::test]
async fn commands_issued_before_any_cycle_are_sent_in_order() {
    let transport = RecordingTransport::new();
    let callbacks = Arc::new(Callbacks::default());
    let footprints = Footprints::new();
    footprints.push("pageView", vec![json!("one")]);
    footprints.push("pageView", vec![json!("two")]);
    footprints.push("pageView", vec![json!("three")]);

    footprints
        .init(config(), options(Arc::clone(&transport), &callbacks))
        .unwrap();
    footprints.flush(FLUSH).await.unwrap();

    let names: Vec<Value> = transport.requests().iter().map(|r| r["name"].clone()).collect();
    assert_eq!(names, vec![json!("one"), json!("two"), json!("three")]);
    assert_eq!(transport.request_ids(), vec!["evt-1", "evt-2", "evt-3"]);
    footprints.shutdown();
}

#[tokio::test]
async fn queued_events_keep_the_context_they_were_built_with() {
    let (footprints, transport, _) = start(config());

    footprints.user("u-1", None);
    footprints.track(Some("opened"), None);
    footprints.user("u-2", None);
    footprints.track(Some("closed"), None);
    footprints.flush(FLUSH).await.unwrap();

    let requests = transport.requests();
    assert_eq!(requests.len(), 2);
    assert_eq!(requests[0]["userId"], "u-1");
    assert_eq!(requests[0]["eventName"], "opened");
    assert_eq!(requests[1]["userId"], "u-2");
    assert_eq!(requests[1]["eventName"], "closed");
    footprints.shutdown();
}

#[tokio::test]
async fn caller_properties_win_but_stamps_cannot_be_overridden() {
    let (footprints, transport, _) = start(config());

    footprints.context(props(json!({ "plan": "free" })));
    footprints.page_view(
        Some("Checkout"),
        Some(props(json!({ "plan": "pro", "path": "/checkout", "eventId": "forged" }))),
    );
    footprints.flush(FLUSH).await.unwrap();

    let request = &transport.requests()[0];
    assert_eq!(request["plan"], "pro");
    assert_eq!(request["path"], "/checkout");
    assert_eq!(request["name"], "Checkout");
    assert_eq!(request["eventId"], "evt-1");
    footprints.shutdown();
}

#[tokio::test]
async fn invalid_commands_are_skipped_without_stopping_the_pipeline() {
    let (footprints, transport, _) = start(config());

    footprints.push("identify", vec![json!("u-1")]);
    footprints.push("context", vec![json!("not an object")]);
    footprints.push("user", vec![]);
    footprints.push("track", vec![json!("still-works")]);
    footprints.flush(FLUSH).await.unwrap();

    let requests = transport.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0]["eventName"], "still-works");
    assert!(footprints.context_snapshot().get("userId").is_none());
    footprints.shutdown();
}

#[tokio::test]
async fn legacy_user_form_writes_name_and_email() {
    let (footprints, _, _) = start(config());

    footprints.push("user", vec![json!(42), json!("Ada"), json!("ada@example.com")]);

    let context = footprints.context_snapshot();
    assert_eq!(context["userId"], 42);
    assert_eq!(context["name"], "Ada");
    assert_eq!(context["email"], "ada@example.com");
    footprints.shutdown();
}

#[tokio::test]
async fn payload_transform_rewrites_the_stamped_document() {
    let transport = RecordingTransport::new();
    let callbacks = Arc::new(Callbacks::default());
    let options = options(Arc::clone(&transport), &callbacks).with_payload_transform(|mut doc| {
        doc.remove("email");
        let key = format!(
            "{}:{}",
            doc["eventType"].as_str().unwrap_or_default(),
            doc["eventId"].as_str().unwrap_or_default()
        );
        doc.insert("dedupKey".to_string(), json!(key));
        doc
    });
    let footprints = Footprints::start(config(), options).unwrap();

    footprints.user("u-1", Some(props(json!({ "email": "x@example.com" }))));
    footprints.track(Some("signup"), None);
    footprints.flush(FLUSH).await.unwrap();

    let request = &transport.requests()[0];
    assert!(request.get("email").is_none());
    assert_eq!(request["dedupKey"], "track:evt-1");
    assert_eq!(request["eventType"], "track");
    assert_eq!(request["eventId"], "evt-1");
    assert_eq!(request["userId"], "u-1");
    footprints.shutdown();
}

#[tokio::test]
async fn stats_reflect_a_drained_pipeline() {
    let (footprints, _, _) = start(config());
    for _ in 0..5 {
        footprints.page_view(None, None);
    }
    footprints.flush(FLUSH).await.unwrap();

    let stats = footprints.stats();
    assert_eq!(stats.pending_commands, 0);
    assert_eq!(stats.pending_events, 0);
    assert_eq!(stats.in_flight, 0);
    assert_eq!(stats.delivered, 5);
    footprints.shutdown();
}

#[tokio::test]
async fn shutdown_stops_processing() {
    let (footprints, transport, _) = start(config());
    footprints.shutdown();

    footprints.page_view(None, None);
    tokio::time::sleep(std::time::Duration::from_millis(80)).await;

    assert!(transport.requests().is_empty());
    assert_eq!(footprints.stats().pending_commands, 1);
}

/// Push `per_thread` tracks from each of `threads` OS threads at once.
async fn push_from_threads(footprints: &Footprints, threads: usize, per_thread: usize) {
    let footprints = footprints.clone();
    tokio::task::spawn_blocking(move || {
        std::thread::scope(|scope| {
            for thread in 0..threads {
                let footprints = footprints.clone();
                scope.spawn(move || {
                    for seq in 0..per_thread {
                        let properties = props(json!({ "thread": thread, "seq": seq }));
                        footprints.track(Some("tick"), Some(properties));
                    }
                });
            }
        });
    })
    .await
    .unwrap();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn concurrent_pushes_are_each_sent_once_in_per_thread_order() {
    let mut config = config();
    config.max_in_flight = 1;
    let (footprints, transport, callbacks) = start(config);

    push_from_threads(&footprints, 8, 200).await;
    footprints.flush(FLUSH).await.unwrap();

    let requests = transport.requests();
    assert_eq!(requests.len(), 1600);
    assert_eq!(callbacks.successes(), 1600);

    let ids: HashSet<String> = transport.request_ids().into_iter().collect();
    assert_eq!(ids.len(), 1600, "every event sent exactly once");

    let mut last_seq: HashMap<u64, i64> = HashMap::new();
    for request in &requests {
        let thread = request["thread"].as_u64().unwrap();
        let seq = request["seq"].as_i64().unwrap();
        let previous = last_seq.insert(thread, seq).unwrap_or(-1);
        assert_eq!(seq, previous + 1, "thread {thread} out of order");
    }
    assert_eq!(last_seq.len(), 8);
    footprints.shutdown();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn timer_cycles_racing_pushes_never_duplicate_events() {
    let mut config = config();
    config.interval_wait_ms = 1;
    config.max_in_flight = 4;
    let (footprints, transport, _) = start(config);

    push_from_threads(&footprints, 4, 250).await;
    footprints.flush(FLUSH).await.unwrap();

    let ids = transport.request_ids();
    assert_eq!(ids.len(), 1000);
    assert_eq!(ids.iter().collect::<HashSet<_>>().len(), 1000);
    assert_eq!(footprints.stats().delivered, 1000);
    footprints.shutdown();
}
