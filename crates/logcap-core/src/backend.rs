//! Backend adapters from logging facades to the capture router
//!
//! - `CaptureLayer`: a `tracing_subscriber` layer; the event target is the logger name
//! - `CaptureLogger`: a `log::Log` implementation; the record target is the logger name
//!
//! Both normalize `::` in targets to `.` and build the event lazily, only when
//! some route admits it.

pub mod layer;
pub mod log_bridge;

pub use layer::CaptureLayer;
pub use log_bridge::CaptureLogger;
