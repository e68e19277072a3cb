//! Scoped capture sessions
//!
//! A session owns one sink and one route in a router. Its lifecycle is
//! `Armed → Capturing → Closed`; `Closed` is terminal. Closing removes the
//! route and seals the sink, and runs on `Drop`, so the wiring is released on
//! every exit path of the enclosing test, panics included.

use std::sync::Arc;
use std::time::{Duration, Instant};

use logcap_core_types::schema::{OP_SESSION_CLOSE, OP_SESSION_OPEN, OP_SESSION_WAIT};
use logcap_core_types::SessionId;
use parking_lot::Mutex;

use crate::assertions::{render_records, Assertions, EventFilter, DEFAULT_RENDER_LIMIT};
use crate::config::CaptureConfig;
use crate::errors::{CaptureError, Result};
use crate::logging_facility::global_router;
use crate::pattern::PatternSet;
use crate::record::{EventRecord, Level};
use crate::router::{CaptureRouter, RouteId};
use crate::sink::{CaptureSink, Snapshot};
use crate::{log_op_end, log_op_error, log_op_start};

/// Lifecycle state of a capture session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Validated, route not yet attached
    Armed,
    /// Route attached, events are being recorded
    Capturing,
    /// Route removed, sequence frozen
    Closed,
}

/// Bounds for `wait_for`: total deadline and polling cadence
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WaitPolicy {
    pub timeout: Duration,
    pub poll_interval: Duration,
}

impl WaitPolicy {
    pub fn new(timeout: Duration, poll_interval: Duration) -> Self {
        Self {
            timeout,
            poll_interval,
        }
    }

    fn sleep_for(&self, remaining: Duration) -> Duration {
        self.poll_interval.min(remaining).max(Duration::from_millis(1))
    }
}

impl Default for WaitPolicy {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(1),
            poll_interval: Duration::from_millis(10),
        }
    }
}

struct Wiring {
    state: SessionState,
    route: Option<RouteId>,
}

/// A scoped attachment that captures matching log events in memory
pub struct CaptureSession {
    id: SessionId,
    router: Arc<CaptureRouter>,
    sink: Arc<CaptureSink>,
    patterns: PatternSet,
    minimum_level: Level,
    render_limit: usize,
    wiring: Mutex<Wiring>,
    opened_at: Instant,
}

impl CaptureSession {
    /// Open a session on the process-wide router
    ///
    /// # Errors
    ///
    /// Returns a configuration error if `patterns` is empty or any pattern is malformed.
    pub fn open<I, S>(patterns: I, minimum_level: Level) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self::open_on(&global_router(), patterns, minimum_level)
    }

    /// Open a session on an injected router
    ///
    /// # Errors
    ///
    /// Returns a configuration error if `patterns` is empty or any pattern is malformed.
    pub fn open_on<I, S>(router: &Arc<CaptureRouter>, patterns: I, minimum_level: Level) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let patterns = PatternSet::parse(patterns).map_err(|err| {
            log_op_error!(OP_SESSION_OPEN, err, duration_ms = 0u64);
            err
        })?;
        Ok(Self::arm(router, patterns, minimum_level, DEFAULT_RENDER_LIMIT).start())
    }

    /// Open a session on the process-wide router from a loaded config
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the config fails validation.
    pub fn from_config(config: &CaptureConfig) -> Result<Self> {
        Self::from_config_on(&global_router(), config)
    }

    /// Open a session on an injected router from a loaded config
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the config fails validation.
    pub fn from_config_on(router: &Arc<CaptureRouter>, config: &CaptureConfig) -> Result<Self> {
        let (patterns, minimum_level) = config.validate().map_err(|err| {
            log_op_error!(OP_SESSION_OPEN, err, duration_ms = 0u64);
            err
        })?;
        Ok(Self::arm(router, patterns, minimum_level, config.render_limit).start())
    }

    /// Run `action` inside a session on the process-wide router, then close it
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the session cannot be opened.
    pub fn capture<I, S, T, F>(patterns: I, minimum_level: Level, action: F) -> Result<(T, Assertions)>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
        F: FnOnce() -> T,
    {
        let session = Self::open(patterns, minimum_level)?;
        let value = action();
        let frozen = session.close();
        Ok((value, Assertions::with_render_limit(frozen, session.render_limit)))
    }

    fn arm(
        router: &Arc<CaptureRouter>,
        patterns: PatternSet,
        minimum_level: Level,
        render_limit: usize,
    ) -> Self {
        Self {
            id: SessionId::new(),
            router: Arc::clone(router),
            sink: Arc::new(CaptureSink::new()),
            patterns,
            minimum_level,
            render_limit,
            wiring: Mutex::new(Wiring {
                state: SessionState::Armed,
                route: None,
            }),
            opened_at: Instant::now(),
        }
    }

    fn start(self) -> Self {
        {
            let mut wiring = self.wiring.lock();
            let route = self.router.attach(
                self.patterns.clone(),
                self.minimum_level,
                Arc::clone(&self.sink),
            );
            wiring.route = Some(route);
            wiring.state = SessionState::Capturing;
        }
        log_op_start!(
            OP_SESSION_OPEN,
            session_id = %self.id,
            patterns = %self.patterns,
            minimum_level = %self.minimum_level,
        );
        self
    }

    pub fn id(&self) -> &SessionId {
        &self.id
    }

    pub fn state(&self) -> SessionState {
        self.wiring.lock().state
    }

    pub fn patterns(&self) -> &PatternSet {
        &self.patterns
    }

    pub fn minimum_level(&self) -> Level {
        self.minimum_level
    }

    /// Current sequence while capturing, frozen final sequence once closed
    pub fn events(&self) -> Snapshot {
        self.sink.snapshot()
    }

    /// Remove and return everything captured so far, for resetting between
    /// sequential actions in one scope. Returns nothing once closed.
    pub fn drain(&self) -> Vec<Arc<EventRecord>> {
        self.sink.drain()
    }

    /// Query view over the current sequence
    pub fn assertions(&self) -> Assertions {
        Assertions::with_render_limit(self.events(), self.render_limit)
    }

    /// Detach from the router and freeze the sequence; idempotent
    pub fn close(&self) -> Snapshot {
        let mut wiring = self.wiring.lock();
        if wiring.state == SessionState::Closed {
            return self.sink.snapshot();
        }

        if let Some(route) = wiring.route.take() {
            self.router.detach(route);
        }
        wiring.state = SessionState::Closed;
        let frozen = self.sink.seal();
        drop(wiring);

        log_op_end!(
            OP_SESSION_CLOSE,
            started = self.opened_at,
            session_id = %self.id,
            captured = frozen.len() as u64,
        );
        frozen
    }

    /// Poll until an event matching `filter` has been captured
    ///
    /// A closed session is checked once, since nothing more can arrive.
    ///
    /// # Errors
    ///
    /// Returns a timeout error carrying the criteria and the captured set if
    /// no match appears before `policy.timeout`.
    pub fn wait_for(&self, filter: &EventFilter, policy: WaitPolicy) -> Result<Arc<EventRecord>> {
        let started = Instant::now();
        loop {
            let remaining = match self.poll(filter, policy, started) {
                Ok(found) => return Ok(found),
                Err(Some(remaining)) => remaining,
                Err(None) => return Err(self.wait_timeout(filter, started)),
            };
            std::thread::sleep(policy.sleep_for(remaining));
        }
    }

    /// Async form of `wait_for`, sleeping on the tokio timer between polls
    ///
    /// # Errors
    ///
    /// Returns a timeout error if no match appears before `policy.timeout`.
    pub async fn wait_for_async(
        &self,
        filter: &EventFilter,
        policy: WaitPolicy,
    ) -> Result<Arc<EventRecord>> {
        let started = Instant::now();
        loop {
            let remaining = match self.poll(filter, policy, started) {
                Ok(found) => return Ok(found),
                Err(Some(remaining)) => remaining,
                Err(None) => return Err(self.wait_timeout(filter, started)),
            };
            tokio::time::sleep(policy.sleep_for(remaining)).await;
        }
    }

    /// One poll step: the match, or the time left to keep waiting (`None` when done)
    fn poll(
        &self,
        filter: &EventFilter,
        policy: WaitPolicy,
        started: Instant,
    ) -> std::result::Result<Arc<EventRecord>, Option<Duration>> {
        let closed = self.state() == SessionState::Closed;
        let snapshot = self.events();
        if let Some(found) = snapshot.records().iter().find(|r| filter.matches(r)) {
            return Ok(Arc::clone(found));
        }
        if closed {
            return Err(None);
        }
        match policy.timeout.checked_sub(started.elapsed()) {
            Some(remaining) if !remaining.is_zero() => Err(Some(remaining)),
            _ => Err(None),
        }
    }

    fn wait_timeout(&self, filter: &EventFilter, started: Instant) -> CaptureError {
        let snapshot = self.events();
        let err = CaptureError::Timeout {
            criteria: filter.to_string(),
            waited_ms: crate::__private::elapsed_ms(started),
            rendering: render_records(snapshot.iter(), self.render_limit),
        };
        log_op_error!(
            OP_SESSION_WAIT,
            err,
            started = started,
            session_id = %self.id,
        );
        err
    }
}

impl Drop for CaptureSession {
    fn drop(&mut self) {
        self.close();
    }
}

impl std::fmt::Debug for CaptureSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CaptureSession")
            .field("id", &self.id)
            .field("patterns", &self.patterns.to_string())
            .field("minimum_level", &self.minimum_level)
            .field("state", &self.state())
            .finish()
    }
}
