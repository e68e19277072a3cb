//! Core types shared across logcap facilities
//!
//! This crate provides foundational types used by both the capture engine
//! and its own logging facility:
//!
//! - **Correlation types**: SessionId
//! - **Schema constants**: Canonical field keys and event names

pub mod correlation;
pub mod schema;

pub use correlation::SessionId;
