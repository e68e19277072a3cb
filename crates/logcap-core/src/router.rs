//! Emission-time routing of events to capture sinks
//!
//! The router is an ordered table of routes, each a `(PatternSet, minimum
//! level, sink)` triple. Backend adapters call `dispatch` once per facade
//! callback; every route whose patterns and level admit the event receives
//! its own copy.
//!
//! `dispatch` only holds the table's read lock while selecting sinks. The
//! event is built and recorded after the guard is released, so formatting code
//! that logs again (or a concurrent `attach`/`detach`) cannot wedge the
//! emitting thread. An emission that selected a sink just before `detach` may
//! still land in it; closing a session seals its sink after detaching, and a
//! sealed sink rejects late records.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use logcap_core_types::schema::SELF_LOGGER_ROOT;
use parking_lot::RwLock;

use crate::backend::CaptureLayer;
use crate::backend::CaptureLogger;
use crate::pattern::PatternSet;
use crate::record::{EmittedEvent, Level};
use crate::sink::CaptureSink;

/// Handle to one attached route
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RouteId(u64);

impl std::fmt::Display for RouteId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "route-{}", self.0)
    }
}

struct Route {
    id: RouteId,
    patterns: PatternSet,
    minimum_level: Level,
    sink: Arc<CaptureSink>,
}

impl Route {
    fn admits(&self, logger_name: &str, level: Level) -> bool {
        level >= self.minimum_level && self.patterns.matches(logger_name)
    }
}

/// Pattern-match table from logger names to capture sinks
pub struct CaptureRouter {
    routes: RwLock<Vec<Route>>,
    next_id: AtomicU64,
    include_own_events: bool,
}

impl CaptureRouter {
    /// A router that ignores this library's own lifecycle events
    pub fn new() -> Arc<Self> {
        Arc::new(Self::with_options(false))
    }

    /// A router that also routes events logged under `logcap_core`
    pub fn include_own_events(include: bool) -> Arc<Self> {
        Arc::new(Self::with_options(include))
    }

    fn with_options(include_own_events: bool) -> Self {
        Self {
            routes: RwLock::new(Vec::new()),
            next_id: AtomicU64::new(1),
            include_own_events,
        }
    }

    /// Add a route at the end of the table
    pub fn attach(
        &self,
        patterns: PatternSet,
        minimum_level: Level,
        sink: Arc<CaptureSink>,
    ) -> RouteId {
        let id = RouteId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.routes.write().push(Route {
            id,
            patterns,
            minimum_level,
            sink,
        });
        id
    }

    /// Remove a route; returns `false` if it was already gone
    pub fn detach(&self, id: RouteId) -> bool {
        let mut routes = self.routes.write();
        let before = routes.len();
        routes.retain(|route| route.id != id);
        routes.len() != before
    }

    pub fn route_count(&self) -> usize {
        self.routes.read().len()
    }

    /// Whether any route would accept an event with this name and level
    pub fn is_interested(&self, logger_name: &str, level: Level) -> bool {
        if self.is_own_event(logger_name) {
            return false;
        }
        self.routes
            .read()
            .iter()
            .any(|route| route.admits(logger_name, level))
    }

    /// Deliver a ready-made event to every admitting route
    ///
    /// Returns the number of sinks that recorded it.
    pub fn dispatch(&self, event: EmittedEvent) -> usize {
        let logger_name = event.logger_name.clone();
        let level = event.level;
        self.dispatch_with(&logger_name, level, move || event)
    }

    /// Deliver an event built lazily: `build` runs at most once, and only if
    /// some route admits `(logger_name, level)`
    pub fn dispatch_with<F>(&self, logger_name: &str, level: Level, build: F) -> usize
    where
        F: FnOnce() -> EmittedEvent,
    {
        if self.is_own_event(logger_name) {
            return 0;
        }

        let targets: Vec<Arc<CaptureSink>> = self
            .routes
            .read()
            .iter()
            .filter(|route| route.admits(logger_name, level))
            .map(|route| Arc::clone(&route.sink))
            .collect();
        if targets.is_empty() {
            return 0;
        }

        let event = build();
        targets
            .iter()
            .filter(|sink| sink.record(event.clone()))
            .count()
    }

    /// `tracing_subscriber` layer feeding this router
    pub fn layer(self: &Arc<Self>) -> CaptureLayer {
        CaptureLayer::new(Arc::clone(self))
    }

    /// `log::Log` implementation feeding this router
    pub fn logger(self: &Arc<Self>) -> CaptureLogger {
        CaptureLogger::new(Arc::clone(self))
    }

    fn is_own_event(&self, logger_name: &str) -> bool {
        !self.include_own_events
            && logger_name
                .strip_prefix(SELF_LOGGER_ROOT)
                .is_some_and(|rest| rest.is_empty() || rest.starts_with('.'))
    }
}

impl std::fmt::Debug for CaptureRouter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CaptureRouter")
            .field("routes", &self.route_count())
            .field("include_own_events", &self.include_own_events)
            .finish()
    }
}
