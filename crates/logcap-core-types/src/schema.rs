//! Canonical schema constants for structured logging and events
//!
//! These constants keep the field names used by the lifecycle macros and the
//! ones the capture layer interprets in one place.

// Canonical field keys for structured logging
pub const FIELD_COMPONENT: &str = "component";
pub const FIELD_OP: &str = "op";
pub const FIELD_EVENT: &str = "event";
pub const FIELD_DURATION_MS: &str = "duration_ms";
pub const FIELD_SESSION_ID: &str = "session_id";

// Fields the capture layer lifts out of an event
pub const FIELD_MESSAGE: &str = "message";
pub const FIELD_ERROR: &str = "error";
pub const FIELD_ERROR_KIND: &str = "error.kind";

// Error fields
pub const FIELD_ERR_KIND: &str = "err.kind";
pub const FIELD_ERR_CODE: &str = "err.code";

// Canonical event names
pub const EVENT_START: &str = "start";
pub const EVENT_END: &str = "end";
pub const EVENT_END_ERROR: &str = "end_error";

// Canonical op names
pub const OP_SESSION_OPEN: &str = "session_open";
pub const OP_SESSION_CLOSE: &str = "session_close";
pub const OP_SESSION_WAIT: &str = "session_wait";

/// Logger-name root of this library's own events
pub const SELF_LOGGER_ROOT: &str = "logcap_core";
