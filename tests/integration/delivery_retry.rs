//! Failure handling: requeue, retry cadence, attempt ceiling and send timeout.

use super::test_utils::{config, start_with, Outcome, RecordingTransport, FLUSH};
use footprints::{DeliveryError, FootprintsError};
use std::time::Duration;

#[tokio::test]
async fn one_failure_then_success() {
    let transport = RecordingTransport::scripted([Outcome::Status(503)]);
    let (footprints, transport, callbacks) = start_with(config(), transport);

    footprints.page_view(Some("home"), None);
    footprints.flush(FLUSH).await.unwrap();

    let ids = transport.request_ids();
    assert_eq!(ids, vec!["evt-1", "evt-1"], "same logical event sent twice");
    assert_eq!(callbacks.errors(), 1);
    assert_eq!(callbacks.successes(), 1);
    assert!(matches!(
        callbacks.last_error.lock().clone(),
        Some(DeliveryError::Status { status: 503, .. })
    ));
    footprints.shutdown();
}

#[tokio::test]
async fn n_failures_mean_n_plus_one_attempts() {
    let failures = 4;
    let transport = RecordingTransport::scripted(vec![Outcome::Status(500); failures]);
    let (footprints, transport, callbacks) = start_with(config(), transport);

    footprints.track(Some("retry-me"), None);
    footprints.flush(FLUSH).await.unwrap();

    assert_eq!(transport.requests().len(), failures + 1);
    assert_eq!(callbacks.errors(), failures);
    assert_eq!(callbacks.successes(), 1);

    let stats = footprints.stats();
    assert_eq!(stats.failed_attempts, failures);
    assert_eq!(stats.delivered, 1);
    assert_eq!(stats.dropped, 0);
    footprints.shutdown();
}

#[tokio::test]
async fn failed_event_goes_behind_later_events() {
    let transport = RecordingTransport::scripted([Outcome::Status(502)]);
    let (footprints, transport, _) = start_with(config(), transport);

    footprints.page_view(Some("first"), None);
    footprints.page_view(Some("second"), None);
    footprints.flush(FLUSH).await.unwrap();

    assert_eq!(transport.request_ids(), vec!["evt-1", "evt-2", "evt-1"]);
    footprints.shutdown();
}

#[tokio::test(start_paused = true)]
async fn retries_wait_for_the_next_cycle() {
    let mut config = config();
    config.interval_wait_ms = 200;
    let transport = RecordingTransport::scripted([Outcome::Status(500)]);
    let (footprints, transport, _) = start_with(config, transport);

    footprints.page_view(None, None);
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(transport.requests().len(), 1, "no retry before the timer fires");
    assert_eq!(footprints.stats().pending_events, 1);

    footprints.flush(FLUSH).await.unwrap();
    assert_eq!(transport.requests().len(), 2);
    footprints.shutdown();
}

#[tokio::test]
async fn attempt_ceiling_drops_the_event() {
    let mut config = config();
    config.max_attempts = Some(2);
    let transport = RecordingTransport::scripted(vec![Outcome::Status(500); 10]);
    let (footprints, transport, callbacks) = start_with(config, transport);

    footprints.track(Some("doomed"), None);
    footprints.flush(FLUSH).await.unwrap();

    assert_eq!(transport.requests().len(), 2);
    assert_eq!(callbacks.errors(), 2);
    assert_eq!(callbacks.successes(), 0);
    assert_eq!(footprints.stats().dropped, 1);
    footprints.shutdown();
}

#[tokio::test(start_paused = true)]
async fn slow_sends_time_out_and_are_retried() {
    let mut config = config();
    config.request_timeout_ms = 30;
    let transport = RecordingTransport::scripted([Outcome::Stall(Duration::from_secs(2))]);
    let (footprints, transport, callbacks) = start_with(config, transport);

    footprints.page_view(None, None);
    footprints.flush(FLUSH).await.unwrap();

    assert_eq!(transport.requests().len(), 2);
    assert!(matches!(
        callbacks.last_error.lock().clone(),
        Some(DeliveryError::Timeout(_))
    ));
    assert_eq!(callbacks.successes(), 1);
    footprints.shutdown();
}

#[tokio::test(start_paused = true)]
async fn flush_gives_up_while_the_endpoint_keeps_failing() {
    let transport = RecordingTransport::scripted(vec![Outcome::Status(500); 1000]);
    let (footprints, _, _) = start_with(config(), transport);

    footprints.page_view(None, None);
    let err = footprints.flush(Duration::from_millis(100)).await.unwrap_err();

    match err {
        FootprintsError::FlushTimeout { pending, in_flight, .. } => {
            assert_eq!(pending + in_flight, 1);
        }
        other => panic!("unexpected error: {other}"),
    }
    footprints.shutdown();
}
