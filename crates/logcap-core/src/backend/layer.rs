//! `tracing` backend: a layer that feeds events into a capture router
//!
//! Fields with canonical names are lifted out of the event:
//! - `message` becomes the rendered message
//! - `error` (an error value or text) becomes the attached `ErrorInfo`
//! - `error.kind` overrides the derived error kind
//!
//! Every other field is kept as text in `fields`.

use std::collections::BTreeMap;
use std::sync::Arc;

use logcap_core_types::schema::{FIELD_ERROR, FIELD_ERROR_KIND, FIELD_MESSAGE};
use tracing::field::{Field, Visit};
use tracing::Subscriber;
use tracing_subscriber::layer::Context;
use tracing_subscriber::Layer;

use crate::pattern::logger_name_from_target;
use crate::record::{EmittedEvent, ErrorInfo, Level, ThreadTag};
use crate::router::CaptureRouter;

#[derive(Default)]
struct EventVisitor {
    message: Option<String>,
    error: Option<ErrorInfo>,
    error_kind: Option<String>,
    fields: BTreeMap<String, String>,
}

impl EventVisitor {
    fn record_text(&mut self, name: &str, text: String) {
        match name {
            FIELD_MESSAGE => self.message = Some(text),
            FIELD_ERROR_KIND => self.error_kind = Some(text),
            FIELD_ERROR => {
                if self.error.is_none() {
                    self.error = Some(ErrorInfo::from_message(text.clone()));
                }
                self.fields.insert(name.to_string(), text);
            }
            _ => {
                self.fields.insert(name.to_string(), text);
            }
        }
    }

    fn into_event(self, level: Level, logger_name: String) -> EmittedEvent {
        let error = match (self.error, self.error_kind) {
            (Some(error), Some(kind)) => Some(error.with_kind(kind)),
            (error, _) => error,
        };
        EmittedEvent {
            level,
            logger_name,
            message: self.message.unwrap_or_default(),
            error,
            fields: self.fields,
            thread: ThreadTag::current(),
        }
    }
}

impl Visit for EventVisitor {
    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        self.record_text(field.name(), format!("{:?}", value));
    }

    fn record_str(&mut self, field: &Field, value: &str) {
        self.record_text(field.name(), value.to_string());
    }

    fn record_i64(&mut self, field: &Field, value: i64) {
        self.record_text(field.name(), value.to_string());
    }

    fn record_u64(&mut self, field: &Field, value: u64) {
        self.record_text(field.name(), value.to_string());
    }

    fn record_bool(&mut self, field: &Field, value: bool) {
        self.record_text(field.name(), value.to_string());
    }

    fn record_f64(&mut self, field: &Field, value: f64) {
        self.record_text(field.name(), value.to_string());
    }

    fn record_error(&mut self, field: &Field, value: &(dyn std::error::Error + 'static)) {
        // An error value outranks an earlier textual `error` field
        if field.name() == FIELD_ERROR || self.error.is_none() {
            self.error = Some(ErrorInfo::from_error(value));
        }
        self.fields
            .insert(field.name().to_string(), value.to_string());
    }
}

/// Layer that routes every `tracing` event to a capture router
#[derive(Debug, Clone)]
pub struct CaptureLayer {
    router: Arc<CaptureRouter>,
}

impl CaptureLayer {
    pub fn new(router: Arc<CaptureRouter>) -> Self {
        Self { router }
    }

    pub fn router(&self) -> &Arc<CaptureRouter> {
        &self.router
    }
}

impl<S> Layer<S> for CaptureLayer
where
    S: Subscriber,
{
    fn on_event(&self, event: &tracing::Event<'_>, _ctx: Context<'_, S>) {
        let metadata = event.metadata();
        let logger_name = logger_name_from_target(metadata.target());
        let level = Level::from(metadata.level());

        self.router.dispatch_with(&logger_name, level, || {
            let mut visitor = EventVisitor::default();
            event.record(&mut visitor);
            visitor.into_event(level, logger_name.clone())
        });
    }
}
