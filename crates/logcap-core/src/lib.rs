//! logcap Core - In-memory capture of log events for test assertions
//!
//! This crate provides:
//! - A thread-safe capture sink with a strict arrival order
//! - A capture router and backend adapters for `tracing` and `log`
//! - Scoped capture sessions with an `Armed → Capturing → Closed` lifecycle
//! - Fluent queries and panicking assertions over captured events
//! - A bounded poll helper for asynchronously produced events
//!
//! ```
//! use logcap_core::{CaptureRouter, CaptureSession, EventFilter, Level};
//!
//! let router = CaptureRouter::new();
//! let session = CaptureSession::open_on(&router, ["app.*"], Level::Info).unwrap();
//!
//! tracing::subscriber::with_default(
//!     tracing_subscriber::layer::SubscriberExt::with(
//!         tracing_subscriber::registry(),
//!         router.layer(),
//!     ),
//!     || {
//!         tracing::info!(target: "app::start", "ready");
//!         tracing::debug!(target: "app::tick", "tick");
//!     },
//! );
//!
//! let captured = session.close();
//! assert_eq!(captured.messages(), vec!["ready"]);
//! captured.assertions().assert_no_errors_logged();
//! assert!(captured
//!     .assertions()
//!     .has_event_matching(&EventFilter::new().level(Level::Info)));
//! ```

pub mod assertions;
pub mod backend;
pub mod config;
pub mod errors;
pub mod logging_facility;
pub mod pattern;
pub mod record;
pub mod router;
pub mod session;
pub mod sink;

// Re-export commonly used types
pub use assertions::{Assertions, EventFilter, TimeWindow};
pub use backend::{CaptureLayer, CaptureLogger};
pub use config::CaptureConfig;
pub use errors::{CaptureError, CaptureErrorKind, Result};
pub use pattern::{NamePattern, PatternSet};
pub use record::{EmittedEvent, ErrorInfo, EventRecord, Level};
pub use router::{CaptureRouter, RouteId};
pub use session::{CaptureSession, SessionState, WaitPolicy};
pub use sink::{CaptureSink, Snapshot};

#[doc(hidden)]
pub mod __private {
    pub use logcap_core_types::schema;
    pub use tracing;

    pub fn elapsed_ms(started: std::time::Instant) -> u64 {
        u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX)
    }
}
