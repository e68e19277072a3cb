//! Fluent queries and assertions over captured events
//!
//! All queries are pure reads over a `Snapshot`. Criteria combine
//! conjunctively; an empty `EventFilter` matches every record. Message
//! matching is case-sensitive; use a regex with `(?i)` to opt out.
//!
//! ```
//! use logcap_core::{EventFilter, Level};
//!
//! let filter = EventFilter::new()
//!     .level(Level::Error)
//!     .logger("app.*".parse().unwrap())
//!     .message_contains("failed");
//! assert_eq!(filter.to_string(), "level=ERROR logger=app.* message contains \"failed\"");
//! ```

use std::fmt;

use chrono::{DateTime, SecondsFormat, Utc};
use regex::Regex;

use crate::errors::{CaptureError, Result};
use crate::pattern::NamePattern;
use crate::record::{EventRecord, Level};
use crate::sink::Snapshot;

/// Records rendered into a failure message before the tail is elided
pub const DEFAULT_RENDER_LIMIT: usize = 50;

/// Level criterion
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LevelMatch {
    Exactly(Level),
    AtLeast(Level),
}

impl LevelMatch {
    fn matches(&self, level: Level) -> bool {
        match self {
            LevelMatch::Exactly(expected) => level == *expected,
            LevelMatch::AtLeast(minimum) => level >= *minimum,
        }
    }
}

/// Message criterion
#[derive(Debug, Clone)]
pub enum MessageMatch {
    Contains(String),
    Equals(String),
    Regex(Regex),
}

impl MessageMatch {
    fn matches(&self, message: &str) -> bool {
        match self {
            MessageMatch::Contains(needle) => message.contains(needle.as_str()),
            MessageMatch::Equals(expected) => message == expected,
            MessageMatch::Regex(re) => re.is_match(message),
        }
    }
}

/// Half-open time range `[start, end)`; a missing bound is unbounded
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TimeWindow {
    start: Option<DateTime<Utc>>,
    end: Option<DateTime<Utc>>,
}

impl TimeWindow {
    /// Events at or after `start`
    pub fn since(start: DateTime<Utc>) -> Self {
        Self {
            start: Some(start),
            end: None,
        }
    }

    /// Events strictly before `end`
    pub fn until(end: DateTime<Utc>) -> Self {
        Self {
            start: None,
            end: Some(end),
        }
    }

    /// Events in `[start, end)`
    ///
    /// # Errors
    ///
    /// Returns a configuration error if `start` is after `end`.
    pub fn between(start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Self> {
        if start > end {
            return Err(CaptureError::configuration(format!(
                "time window start {} is after end {}",
                start.to_rfc3339(),
                end.to_rfc3339()
            )));
        }
        Ok(Self {
            start: Some(start),
            end: Some(end),
        })
    }

    /// Events within `tolerance` of `instant`, both sides inclusive of `instant`
    pub fn around(instant: DateTime<Utc>, tolerance: chrono::Duration) -> Self {
        let tolerance = tolerance.abs();
        Self {
            start: instant.checked_sub_signed(tolerance),
            end: instant
                .checked_add_signed(tolerance)
                .and_then(|end| end.checked_add_signed(chrono::Duration::nanoseconds(1))),
        }
    }

    pub fn contains(&self, timestamp: DateTime<Utc>) -> bool {
        self.start.map_or(true, |start| timestamp >= start)
            && self.end.map_or(true, |end| timestamp < end)
    }
}

impl fmt::Display for TimeWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let bound = |b: Option<DateTime<Utc>>| {
            b.map(|t| t.to_rfc3339_opts(SecondsFormat::Micros, true))
                .unwrap_or_else(|| "..".to_string())
        };
        write!(f, "[{}, {})", bound(self.start), bound(self.end))
    }
}

/// Conjunctive match criteria over event records
#[derive(Debug, Clone, Default)]
pub struct EventFilter {
    level: Option<LevelMatch>,
    logger: Option<NamePattern>,
    message: Option<MessageMatch>,
    window: Option<TimeWindow>,
    has_error: Option<bool>,
    fields: Vec<(String, String)>,
}

impl EventFilter {
    /// A filter matching every record
    pub fn new() -> Self {
        Self::default()
    }

    pub fn level(mut self, level: Level) -> Self {
        self.level = Some(LevelMatch::Exactly(level));
        self
    }

    pub fn at_least(mut self, level: Level) -> Self {
        self.level = Some(LevelMatch::AtLeast(level));
        self
    }

    pub fn logger(mut self, pattern: NamePattern) -> Self {
        self.logger = Some(pattern);
        self
    }

    /// Literal, case-sensitive substring
    pub fn message_contains(mut self, needle: impl Into<String>) -> Self {
        self.message = Some(MessageMatch::Contains(needle.into()));
        self
    }

    pub fn message_eq(mut self, expected: impl Into<String>) -> Self {
        self.message = Some(MessageMatch::Equals(expected.into()));
        self
    }

    pub fn message_matches(mut self, re: Regex) -> Self {
        self.message = Some(MessageMatch::Regex(re));
        self
    }

    pub fn within(mut self, window: TimeWindow) -> Self {
        self.window = Some(window);
        self
    }

    /// Require (or forbid) an attached error
    pub fn with_error(mut self, present: bool) -> Self {
        self.has_error = Some(present);
        self
    }

    /// Require a structured field with this exact rendered value
    pub fn field(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields.push((key.into(), value.into()));
        self
    }

    pub fn matches(&self, record: &EventRecord) -> bool {
        self.level.map_or(true, |l| l.matches(record.level()))
            && self
                .logger
                .as_ref()
                .map_or(true, |p| p.matches(record.logger_name()))
            && self
                .message
                .as_ref()
                .map_or(true, |m| m.matches(record.message()))
            && self.window.map_or(true, |w| w.contains(record.timestamp()))
            && self
                .has_error
                .map_or(true, |present| record.error().is_some() == present)
            && self
                .fields
                .iter()
                .all(|(key, value)| record.field(key) == Some(value.as_str()))
    }
}

impl fmt::Display for EventFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut parts: Vec<String> = Vec::new();
        match self.level {
            Some(LevelMatch::Exactly(level)) => parts.push(format!("level={}", level)),
            Some(LevelMatch::AtLeast(level)) => parts.push(format!("level>={}", level)),
            None => {}
        }
        if let Some(logger) = &self.logger {
            parts.push(format!("logger={}", logger));
        }
        match &self.message {
            Some(MessageMatch::Contains(needle)) => {
                parts.push(format!("message contains {:?}", needle))
            }
            Some(MessageMatch::Equals(expected)) => parts.push(format!("message == {:?}", expected)),
            Some(MessageMatch::Regex(re)) => parts.push(format!("message =~ /{}/", re.as_str())),
            None => {}
        }
        if let Some(window) = &self.window {
            parts.push(format!("within {}", window));
        }
        if let Some(present) = self.has_error {
            parts.push(if present { "with error" } else { "without error" }.to_string());
        }
        for (key, value) in &self.fields {
            parts.push(format!("{}={:?}", key, value));
        }

        if parts.is_empty() {
            write!(f, "any event")
        } else {
            write!(f, "{}", parts.join(" "))
        }
    }
}

/// Render records one per line, eliding everything past `limit`
pub fn render_records<'a, I>(records: I, limit: usize) -> String
where
    I: IntoIterator<Item = &'a EventRecord>,
{
    let mut lines: Vec<String> = Vec::new();
    let mut total = 0usize;
    for record in records {
        if total < limit {
            lines.push(format!("  {}", record));
        }
        total += 1;
    }

    if total == 0 {
        return "  (no events captured)".to_string();
    }
    if total > limit {
        lines.push(format!("  ... {} more", total - limit));
    }
    lines.join("\n")
}

/// Read-only query view over a snapshot
#[derive(Debug, Clone)]
pub struct Assertions {
    snapshot: Snapshot,
    render_limit: usize,
}

impl Assertions {
    pub fn new(snapshot: Snapshot) -> Self {
        Self::with_render_limit(snapshot, DEFAULT_RENDER_LIMIT)
    }

    pub fn with_render_limit(snapshot: Snapshot, render_limit: usize) -> Self {
        Self {
            snapshot,
            render_limit,
        }
    }

    pub fn snapshot(&self) -> &Snapshot {
        &self.snapshot
    }

    pub fn has_event_matching(&self, filter: &EventFilter) -> bool {
        self.snapshot.iter().any(|r| filter.matches(r))
    }

    pub fn count_matching(&self, filter: &EventFilter) -> usize {
        self.snapshot.iter().filter(|r| filter.matches(r)).count()
    }

    pub fn first_matching(&self, filter: &EventFilter) -> Option<&EventRecord> {
        self.snapshot.iter().find(|r| filter.matches(r))
    }

    /// Every match, in arrival order
    pub fn all_matching(&self, filter: &EventFilter) -> Vec<&EventRecord> {
        self.snapshot.iter().filter(|r| filter.matches(r)).collect()
    }

    /// First match, or an assertion failure listing what was captured
    ///
    /// # Errors
    ///
    /// Returns an assertion failure if nothing matches.
    pub fn expect_event_matching(&self, filter: &EventFilter) -> Result<&EventRecord> {
        self.first_matching(filter)
            .ok_or_else(|| CaptureError::AssertionFailure {
                criteria: format!("an event matching {}", filter),
                rendering: self.render_all(),
            })
    }

    /// # Errors
    ///
    /// Returns an assertion failure if the number of matches differs from `expected`.
    pub fn check_count(&self, filter: &EventFilter, expected: usize) -> Result<()> {
        let matching = self.all_matching(filter);
        if matching.len() == expected {
            return Ok(());
        }
        Err(CaptureError::AssertionFailure {
            criteria: format!(
                "{} event(s) matching {}, found {}",
                expected,
                filter,
                matching.len()
            ),
            rendering: self.render_all(),
        })
    }

    /// No ERROR records and no records carrying an error
    ///
    /// # Errors
    ///
    /// Returns an assertion failure enumerating the offending records.
    pub fn check_no_errors_logged(&self) -> Result<()> {
        let offending: Vec<&EventRecord> =
            self.snapshot.iter().filter(|r| r.is_error()).collect();
        if offending.is_empty() {
            return Ok(());
        }
        Err(CaptureError::AssertionFailure {
            criteria: format!(
                "no errors logged, found {} of {} captured event(s)",
                offending.len(),
                self.snapshot.len()
            ),
            rendering: render_records(offending, self.render_limit),
        })
    }

    /// # Panics
    ///
    /// Panics with a diagnostic message if nothing matches.
    pub fn assert_event_matching(&self, filter: &EventFilter) -> &EventRecord {
        match self.expect_event_matching(filter) {
            Ok(record) => record,
            Err(err) => panic!("{}", err),
        }
    }

    /// # Panics
    ///
    /// Panics with a diagnostic message if the count differs.
    pub fn assert_count(&self, filter: &EventFilter, expected: usize) {
        if let Err(err) = self.check_count(filter, expected) {
            panic!("{}", err);
        }
    }

    /// # Panics
    ///
    /// Panics listing every ERROR record or record carrying an error.
    pub fn assert_no_errors_logged(&self) {
        if let Err(err) = self.check_no_errors_logged() {
            panic!("{}", err);
        }
    }

    fn render_all(&self) -> String {
        render_records(self.snapshot.iter(), self.render_limit)
    }
}
