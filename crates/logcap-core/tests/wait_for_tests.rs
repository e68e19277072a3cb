#![allow(clippy::unwrap_used, clippy::expect_used)]

mod common;

use std::thread;
use std::time::{Duration, Instant};

use common::{capture_dispatch, emit, local_session};
use logcap_core::{EventFilter, Level, WaitPolicy};

#[test]
fn test_wait_for_observes_event_from_background_thread() {
    // GIVEN a session and a worker that logs after a delay
    let (router, session) = local_session(&["worker.*"], Level::Info);
    let dispatch = capture_dispatch(&router);
    let worker = thread::spawn(move || {
        thread::sleep(Duration::from_millis(30));
        tracing::dispatcher::with_default(&dispatch, || {
            tracing::info!(target: "worker::job", job = "j-7", "job finished");
        });
    });

    // WHEN waiting for the completion message
    let found = session
        .wait_for(
            &EventFilter::new().message_contains("finished"),
            WaitPolicy::new(Duration::from_secs(5), Duration::from_millis(5)),
        )
        .expect("Should observe the background event");
    worker.join().unwrap();

    // THEN the matching record is returned
    assert_eq!(found.logger_name(), "worker.job");
    assert_eq!(found.field("job"), Some("j-7"));
}

#[test]
fn test_wait_for_times_out_with_diagnostics() {
    // GIVEN a session with one unrelated event
    let (router, session) = local_session(&["worker.*"], Level::Info);
    emit(&router, Level::Info, "worker.idle", "idle");

    // WHEN waiting for something that never arrives
    let started = Instant::now();
    let err = session
        .wait_for(
            &EventFilter::new().level(Level::Error),
            WaitPolicy::new(Duration::from_millis(60), Duration::from_millis(10)),
        )
        .expect_err("Should time out");

    // THEN a timeout error carries the criteria and captured set
    assert!(started.elapsed() >= Duration::from_millis(60));
    assert_eq!(err.code(), "ERR_TIMEOUT");
    assert_eq!(err.criteria(), Some("level=ERROR"));
    assert!(err.rendering().unwrap().contains("worker.idle: idle"));
}

#[test]
fn test_wait_for_returns_already_captured_match_immediately() {
    let (router, session) = local_session(&["worker.*"], Level::Info);
    emit(&router, Level::Warn, "worker.slow", "slow");

    let found = session
        .wait_for(
            &EventFilter::new().at_least(Level::Warn),
            WaitPolicy::new(Duration::from_millis(1), Duration::from_millis(1)),
        )
        .unwrap();

    assert_eq!(found.message(), "slow");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_wait_for_async_observes_event_from_task() {
    // GIVEN a task that dispatches after a delay
    let (router, session) = local_session(&["task.*"], Level::Trace);
    let producer = {
        let router = std::sync::Arc::clone(&router);
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            emit(&router, Level::Info, "task.done", "done");
        })
    };

    // WHEN awaiting the event
    let found = session
        .wait_for_async(
            &EventFilter::new().logger("task.*".parse().unwrap()),
            WaitPolicy::new(Duration::from_secs(5), Duration::from_millis(5)),
        )
        .await
        .expect("Should observe the task event");
    producer.await.unwrap();

    // THEN it is the produced record
    assert_eq!(found.message(), "done");
}

#[tokio::test]
async fn test_wait_for_async_times_out() {
    let (_router, session) = local_session(&["task.*"], Level::Trace);

    let err = session
        .wait_for_async(
            &EventFilter::new().message_eq("never"),
            WaitPolicy::new(Duration::from_millis(20), Duration::from_millis(5)),
        )
        .await
        .expect_err("Should time out");

    assert_eq!(err.code(), "ERR_TIMEOUT");
}
