#![allow(clippy::unwrap_used, clippy::expect_used)]

mod common;

use std::time::Duration;

use common::{emit, local_session};
use logcap_core::{CaptureError, CaptureErrorKind, EventFilter, Level, TimeWindow, WaitPolicy};

#[test]
fn test_error_kinds_have_stable_codes() {
    assert_eq!(CaptureErrorKind::Configuration.code(), "ERR_CONFIGURATION");
    assert_eq!(CaptureErrorKind::Timeout.code(), "ERR_TIMEOUT");
    assert_eq!(CaptureErrorKind::AssertionFailure.code(), "ERR_ASSERTION_FAILED");
}

#[test]
fn test_configuration_error_from_open() {
    let router = logcap_core::CaptureRouter::new();
    let err = logcap_core::CaptureSession::open_on(&router, ["a..b"], Level::Info).unwrap_err();

    assert_eq!(err.kind(), CaptureErrorKind::Configuration);
    assert!(err.criteria().is_none());
    assert!(err.to_string().contains("a..b"));
}

#[test]
fn test_timeout_error_carries_criteria() {
    let (_router, session) = local_session(&["svc"], Level::Info);

    let err = session
        .wait_for(
            &EventFilter::new().message_contains("ready"),
            WaitPolicy::new(Duration::from_millis(10), Duration::from_millis(2)),
        )
        .unwrap_err();

    assert!(matches!(err, CaptureError::Timeout { .. }));
    assert_eq!(err.criteria(), Some("message contains \"ready\""));
    assert!(err.rendering().unwrap().contains("no events captured"));
}

#[test]
fn test_assertion_failure_renders_capped_listing() {
    // GIVEN more records than the render limit
    let (router, session) = local_session(&["svc"], Level::Info);
    for i in 0..60 {
        emit(&router, Level::Info, "svc", &format!("m{}", i));
    }

    // WHEN an expectation fails
    let err = session
        .assertions()
        .expect_event_matching(&EventFilter::new().level(Level::Error))
        .unwrap_err();

    // THEN the listing is capped with a tail count
    assert_eq!(err.kind(), CaptureErrorKind::AssertionFailure);
    let rendering = err.rendering().unwrap();
    assert!(rendering.contains("svc: m49"));
    assert!(!rendering.contains("svc: m50"));
    assert!(rendering.ends_with("... 10 more"));
}

#[test]
fn test_inverted_time_window_is_configuration_error() {
    let now = chrono::Utc::now();
    let err = TimeWindow::between(now, now - chrono::Duration::seconds(1)).unwrap_err();

    assert_eq!(err.kind(), CaptureErrorKind::Configuration);
}

#[test]
fn test_time_window_selects_events() {
    let (router, session) = local_session(&["svc"], Level::Info);
    emit(&router, Level::Info, "svc", "before");
    let boundary = session.events().get(0).unwrap().timestamp() + chrono::Duration::nanoseconds(1);
    std::thread::sleep(Duration::from_millis(2));
    emit(&router, Level::Info, "svc", "after");

    let assertions = session.close().assertions();
    let later = assertions.all_matching(&EventFilter::new().within(TimeWindow::since(boundary)));
    let earlier = assertions.all_matching(&EventFilter::new().within(TimeWindow::until(boundary)));

    assert_eq!(later.iter().map(|r| r.message()).collect::<Vec<_>>(), vec!["after"]);
    assert_eq!(earlier.iter().map(|r| r.message()).collect::<Vec<_>>(), vec!["before"]);
}
