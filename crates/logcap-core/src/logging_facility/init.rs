//! Logging initialization module
//!
//! Provides a single initialization point for the logging facility and the
//! process-wide capture router behind it.

use std::sync::{Arc, OnceLock};

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::{EnvFilter, Layer};

use crate::router::CaptureRouter;

/// Logging profile configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Profile {
    /// Human-readable output alongside capture
    Development,
    /// JSON structured output alongside capture
    Production,
    /// Capture only, no console output
    Test,
}

static GLOBAL_ROUTER: OnceLock<Arc<CaptureRouter>> = OnceLock::new();

fn env_filter(default: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default))
}

/// Initialize the logging facility
///
/// The first call installs, as the process-wide defaults:
/// - a `tracing_subscriber` registry carrying the capture layer, plus a
///   console layer for `Development`/`Production` (filtered per layer by
///   `RUST_LOG`, so the filter never hides events from capture)
/// - the `log` bridge as the global logger, with max level TRACE
///
/// Later calls return the same router regardless of profile. If another
/// global subscriber or logger was installed first, a warning is emitted
/// through it and that facade is left uncaptured.
///
/// # Example
///
/// ```
/// use logcap_core::logging_facility::{init, Profile};
///
/// let first = init(Profile::Test);
/// let second = init(Profile::Development);
/// assert!(std::sync::Arc::ptr_eq(&first, &second));
/// ```
pub fn init(profile: Profile) -> Arc<CaptureRouter> {
    GLOBAL_ROUTER
        .get_or_init(|| {
            let router = CaptureRouter::new();

            let development = (profile == Profile::Development)
                .then(|| tracing_subscriber::fmt::layer().with_filter(env_filter("info")));
            let production = (profile == Profile::Production).then(|| {
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_filter(env_filter("info"))
            });

            let subscriber = tracing_subscriber::registry()
                .with(router.layer())
                .with(development)
                .with(production);
            let installed = tracing::subscriber::set_global_default(subscriber);
            if let Err(err) = installed {
                tracing::warn!(
                    error = %err,
                    "global tracing subscriber already set; tracing events will not be captured"
                );
            }

            match log::set_boxed_logger(Box::new(router.logger())) {
                Ok(()) => log::set_max_level(log::LevelFilter::Trace),
                Err(err) => tracing::warn!(
                    error = %err,
                    "global logger already set; log records will not be captured"
                ),
            }

            router
        })
        .clone()
}

/// The process-wide capture router, initializing with `Profile::Test` if needed
pub fn global_router() -> Arc<CaptureRouter> {
    match GLOBAL_ROUTER.get() {
        Some(router) => Arc::clone(router),
        None => init(Profile::Test),
    }
}
