//! `log` backend: a `log::Log` implementation that feeds a capture router

use std::sync::Arc;

use crate::pattern::logger_name_from_target;
use crate::record::{EmittedEvent, Level};
use crate::router::CaptureRouter;

/// Logger that routes `log` records to a capture router
///
/// Source location, when present, is kept in the `log.module_path`,
/// `log.file` and `log.line` fields.
#[derive(Debug, Clone)]
pub struct CaptureLogger {
    router: Arc<CaptureRouter>,
}

impl CaptureLogger {
    pub fn new(router: Arc<CaptureRouter>) -> Self {
        Self { router }
    }
}

impl log::Log for CaptureLogger {
    fn enabled(&self, metadata: &log::Metadata<'_>) -> bool {
        self.router.is_interested(
            &logger_name_from_target(metadata.target()),
            Level::from(metadata.level()),
        )
    }

    fn log(&self, record: &log::Record<'_>) {
        let logger_name = logger_name_from_target(record.target());
        let level = Level::from(record.level());

        self.router.dispatch_with(&logger_name, level, || {
            let mut event =
                EmittedEvent::new(level, logger_name.clone(), record.args().to_string());
            if let Some(module_path) = record.module_path() {
                event = event.with_field("log.module_path", module_path);
            }
            if let Some(file) = record.file() {
                event = event.with_field("log.file", file);
            }
            if let Some(line) = record.line() {
                event = event.with_field("log.line", line.to_string());
            }
            event
        });
    }

    fn flush(&self) {}
}
