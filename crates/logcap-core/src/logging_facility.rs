//! Structured logging facility for logcap
//!
//! This module provides:
//! - Single initialization point via `init(profile)`, which also installs the
//!   process-wide capture router as the `tracing` and `log` backend
//! - Structured logging macros (`log_op_start!`, `log_op_end!`, `log_op_error!`)
//!   used for the library's own session lifecycle events
//!
//! # Usage
//!
//! ```rust
//! use logcap_core::logging_facility::{init, Profile};
//!
//! // Initialize once, before the first capture session
//! let router = init(Profile::Test);
//! assert_eq!(router.route_count(), 0);
//! ```
//!
//! # Logging Macros
//!
//! - `log_op_start!(op, ...)` - Log operation start
//! - `log_op_end!(op, duration_ms = ...)` - Log operation end
//! - `log_op_error!(op, err, duration_ms = ...)` - Log operation error

pub mod init;
pub mod macros;

pub use init::{global_router, init, Profile};
