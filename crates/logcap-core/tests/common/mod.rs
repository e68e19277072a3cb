use std::sync::Arc;

use logcap_core::{CaptureRouter, CaptureSession, EmittedEvent, Level};
use tracing_subscriber::layer::SubscriberExt;

/// A `tracing` dispatcher whose only layer feeds `router`
///
/// Clone it into spawned threads and enter it with
/// `tracing::dispatcher::with_default`.
#[allow(dead_code)]
pub fn capture_dispatch(router: &Arc<CaptureRouter>) -> tracing::Dispatch {
    tracing::Dispatch::new(tracing_subscriber::registry().with(router.layer()))
}

/// Run `f` with `router` receiving every `tracing` event on this thread
#[allow(dead_code)]
pub fn with_capture<T>(router: &Arc<CaptureRouter>, f: impl FnOnce() -> T) -> T {
    tracing::dispatcher::with_default(&capture_dispatch(router), f)
}

/// Open a session on a fresh local router
#[allow(dead_code)]
pub fn local_session(patterns: &[&str], level: Level) -> (Arc<CaptureRouter>, CaptureSession) {
    let router = CaptureRouter::new();
    let session =
        CaptureSession::open_on(&router, patterns, level).expect("Should open capture session");
    (router, session)
}

/// Dispatch a plain event straight into `router`
#[allow(dead_code)]
pub fn emit(router: &CaptureRouter, level: Level, logger_name: &str, message: &str) -> usize {
    router.dispatch(EmittedEvent::new(level, logger_name, message))
}
