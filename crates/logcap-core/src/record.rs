//! Captured log event values
//!
//! An `EmittedEvent` is the draft a backend adapter builds from one facade
//! callback. The sink stamps it with an arrival sequence number and a
//! timestamp, producing an immutable `EventRecord`.

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;

use crate::errors::CaptureError;

/// Severity of a log event, ordered from least to most severe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Level {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl Level {
    /// All levels, least severe first
    pub const ALL: [Level; 5] = [
        Level::Trace,
        Level::Debug,
        Level::Info,
        Level::Warn,
        Level::Error,
    ];

    /// Upper-case name, as printed in diagnostics
    pub fn as_str(&self) -> &'static str {
        match self {
            Level::Trace => "TRACE",
            Level::Debug => "DEBUG",
            Level::Info => "INFO",
            Level::Warn => "WARN",
            Level::Error => "ERROR",
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for Level {
    type Err = CaptureError;

    /// Parse a severity name, ignoring case. `warning` is accepted for `WARN`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "trace" => Ok(Level::Trace),
            "debug" => Ok(Level::Debug),
            "info" => Ok(Level::Info),
            "warn" | "warning" => Ok(Level::Warn),
            "error" => Ok(Level::Error),
            _ => Err(CaptureError::configuration(format!(
                "unrecognized severity '{}' (expected one of TRACE, DEBUG, INFO, WARN, ERROR)",
                s
            ))),
        }
    }
}

impl From<&tracing::Level> for Level {
    fn from(level: &tracing::Level) -> Self {
        match *level {
            tracing::Level::TRACE => Level::Trace,
            tracing::Level::DEBUG => Level::Debug,
            tracing::Level::INFO => Level::Info,
            tracing::Level::WARN => Level::Warn,
            tracing::Level::ERROR => Level::Error,
        }
    }
}

impl From<log::Level> for Level {
    fn from(level: log::Level) -> Self {
        match level {
            log::Level::Trace => Level::Trace,
            log::Level::Debug => Level::Debug,
            log::Level::Info => Level::Info,
            log::Level::Warn => Level::Warn,
            log::Level::Error => Level::Error,
        }
    }
}

/// Cause chains longer than this are truncated (guards against cyclic `source()`).
const MAX_CAUSE_DEPTH: usize = 32;

/// A failure attached to a log event: kind, message and nested cause chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorInfo {
    pub kind: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cause: Option<Box<ErrorInfo>>,
}

impl ErrorInfo {
    /// Build from plain text, e.g. an `error = "boom"` field
    pub fn from_message(message: impl Into<String>) -> Self {
        Self {
            kind: "Error".to_string(),
            message: message.into(),
            cause: None,
        }
    }

    /// Build from an error value, following its `source()` chain
    pub fn from_error(err: &(dyn std::error::Error + 'static)) -> Self {
        Self::from_error_at_depth(err, 0)
    }

    fn from_error_at_depth(err: &(dyn std::error::Error + 'static), depth: usize) -> Self {
        let cause = match err.source() {
            Some(source) if depth + 1 < MAX_CAUSE_DEPTH => {
                Some(Box::new(Self::from_error_at_depth(source, depth + 1)))
            }
            _ => None,
        };
        Self {
            kind: kind_of(err),
            message: err.to_string(),
            cause,
        }
    }

    /// Replace the derived kind with one the emitter named explicitly
    pub fn with_kind(mut self, kind: impl Into<String>) -> Self {
        self.kind = kind.into();
        self
    }

    /// Iterate over this error and its causes, outermost first
    pub fn chain(&self) -> impl Iterator<Item = &ErrorInfo> {
        std::iter::successors(Some(self), |e| e.cause.as_deref())
    }
}

impl fmt::Display for ErrorInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)?;
        if let Some(cause) = &self.cause {
            write!(f, " (caused by {})", cause)?;
        }
        Ok(())
    }
}

/// Leading identifier of the error's `Debug` rendering: the variant name for
/// derived enums (`Boom`, `NotFound { .. }`), the type name for unit structs.
fn kind_of(err: &(dyn std::error::Error + 'static)) -> String {
    let debug = format!("{:?}", err);
    let ident: String = debug
        .chars()
        .take_while(|c| c.is_alphanumeric() || *c == '_')
        .collect();
    if ident.is_empty() || ident.starts_with(|c: char| c.is_ascii_digit()) {
        "Error".to_string()
    } else {
        ident
    }
}

/// Identity of the thread that emitted an event
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct ThreadTag {
    pub id: String,
    pub name: Option<String>,
}

impl ThreadTag {
    /// Tag for the calling thread
    pub fn current() -> Self {
        let thread = std::thread::current();
        Self {
            id: format!("{:?}", thread.id()),
            name: thread.name().map(str::to_string),
        }
    }
}

impl fmt::Display for ThreadTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.name {
            Some(name) => write!(f, "{}[{}]", name, self.id),
            None => write!(f, "{}", self.id),
        }
    }
}

/// One facade emission, before the sink has sequenced it
#[derive(Debug, Clone, PartialEq)]
pub struct EmittedEvent {
    pub level: Level,
    pub logger_name: String,
    pub message: String,
    pub error: Option<ErrorInfo>,
    pub fields: BTreeMap<String, String>,
    pub thread: ThreadTag,
}

impl EmittedEvent {
    /// A plain event from the calling thread with no error or fields
    pub fn new(level: Level, logger_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            level,
            logger_name: logger_name.into(),
            message: message.into(),
            error: None,
            fields: BTreeMap::new(),
            thread: ThreadTag::current(),
        }
    }

    pub fn with_error(mut self, error: ErrorInfo) -> Self {
        self.error = Some(error);
        self
    }

    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields.insert(key.into(), value.into());
        self
    }
}

/// An immutable captured log event
///
/// Equality and ordering use `(timestamp, seq)`. `seq` is unique within the
/// sink that produced the record, so records from one sink are totally ordered
/// and that order is their arrival order.
#[derive(Debug, Clone, Serialize)]
pub struct EventRecord {
    seq: u64,
    timestamp: DateTime<Utc>,
    #[serde(skip)]
    offset: Duration,
    level: Level,
    logger_name: String,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<ErrorInfo>,
    thread: ThreadTag,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    fields: BTreeMap<String, String>,
}

impl EventRecord {
    /// Stamp a draft; only the sink calls this, under its lock
    pub(crate) fn stamp(
        event: EmittedEvent,
        seq: u64,
        timestamp: DateTime<Utc>,
        offset: Duration,
    ) -> Self {
        Self {
            seq,
            timestamp,
            offset,
            level: event.level,
            logger_name: event.logger_name,
            message: event.message,
            error: event.error,
            thread: event.thread,
            fields: event.fields,
        }
    }

    /// Arrival sequence number
    pub fn seq(&self) -> u64 {
        self.seq
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    /// Monotonic time since the capturing sink was created
    pub fn offset(&self) -> Duration {
        self.offset
    }

    pub fn level(&self) -> Level {
        self.level
    }

    pub fn logger_name(&self) -> &str {
        &self.logger_name
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn error(&self) -> Option<&ErrorInfo> {
        self.error.as_ref()
    }

    pub fn thread(&self) -> &ThreadTag {
        &self.thread
    }

    pub fn fields(&self) -> &BTreeMap<String, String> {
        &self.fields
    }

    /// Look up one structured field
    pub fn field(&self, key: &str) -> Option<&str> {
        self.fields.get(key).map(String::as_str)
    }

    /// ERROR level or carrying an attached error
    pub fn is_error(&self) -> bool {
        self.level == Level::Error || self.error.is_some()
    }
}

impl PartialEq for EventRecord {
    fn eq(&self, other: &Self) -> bool {
        self.timestamp == other.timestamp && self.seq == other.seq
    }
}

impl Eq for EventRecord {}

impl PartialOrd for EventRecord {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for EventRecord {
    fn cmp(&self, other: &Self) -> Ordering {
        self.timestamp
            .cmp(&other.timestamp)
            .then(self.seq.cmp(&other.seq))
    }
}

impl fmt::Display for EventRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "#{} {} {:<5} {}: {}",
            self.seq,
            self.timestamp.to_rfc3339_opts(SecondsFormat::Micros, true),
            self.level,
            self.logger_name,
            self.message
        )?;
        if let Some(error) = &self.error {
            write!(f, " [error: {}]", error)?;
        }
        Ok(())
    }
}
