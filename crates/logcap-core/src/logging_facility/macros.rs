//! Canonical logging macros
//!
//! Every macro emits one event carrying `component`, `op` and `event`, plus
//! any extra fields in `tracing` syntax. Durations are given either as a
//! literal `duration_ms = ...` or as `started = <Instant>`, in which case the
//! elapsed milliseconds are computed (saturating) at the call site.
//!
//! Events land under the calling module's target, which the capture router
//! ignores unless built with `include_own_events(true)`.

#[doc(hidden)]
#[macro_export]
macro_rules! __log_op {
    ($level:ident, $op:expr, $event:ident; $($field:tt)*) => {
        $crate::__private::tracing::$level!(
            component = module_path!(),
            op = $op,
            event = $crate::__private::schema::$event,
            $($field)*
        )
    };
}

/// Log the start of an operation at DEBUG
///
/// ```
/// # use logcap_core::log_op_start;
/// log_op_start!("session_open");
/// log_op_start!("session_open", session_id = "0190f0a4-1c2b-7d3e-8f40-123456789abc");
/// ```
#[macro_export]
macro_rules! log_op_start {
    ($op:expr $(, $($field:tt)*)?) => {{
        $crate::__log_op!(debug, $op, EVENT_START; $($($field)*)?);
    }};
}

/// Log the successful end of an operation at DEBUG
///
/// ```
/// # use logcap_core::log_op_end;
/// let started = std::time::Instant::now();
/// log_op_end!("session_close", started = started, captured = 3u64);
/// log_op_end!("session_close", duration_ms = 42);
/// ```
#[macro_export]
macro_rules! log_op_end {
    ($op:expr, started = $started:expr $(, $($field:tt)*)?) => {{
        $crate::__log_op!(
            debug, $op, EVENT_END;
            duration_ms = $crate::__private::elapsed_ms($started),
            $($($field)*)?
        );
    }};
    ($op:expr, duration_ms = $duration:expr $(, $($field:tt)*)?) => {{
        $crate::__log_op!(debug, $op, EVENT_END; duration_ms = $duration, $($($field)*)?);
    }};
}

/// Log an operation that failed with a `CaptureError`, at WARN
///
/// The error's kind and stable code are attached as `err.kind` and `err.code`.
///
/// ```
/// # use logcap_core::{log_op_error, errors::CaptureError};
/// let err = CaptureError::configuration("no patterns");
/// log_op_error!("session_open", err, duration_ms = 0);
/// ```
#[macro_export]
macro_rules! log_op_error {
    ($op:expr, $err:expr, started = $started:expr $(, $($field:tt)*)?) => {{
        let err: &$crate::errors::CaptureError = &$err;
        $crate::__log_op!(
            warn, $op, EVENT_END_ERROR;
            duration_ms = $crate::__private::elapsed_ms($started),
            err.kind = ?err.kind(),
            err.code = err.code(),
            $($($field)*)?
        );
    }};
    ($op:expr, $err:expr, duration_ms = $duration:expr $(, $($field:tt)*)?) => {{
        let err: &$crate::errors::CaptureError = &$err;
        $crate::__log_op!(
            warn, $op, EVENT_END_ERROR;
            duration_ms = $duration,
            err.kind = ?err.kind(),
            err.code = err.code(),
            $($($field)*)?
        );
    }};
}
