//! High-level API wrappers
//!
//! Thin wrappers around the raw HTTP clients that add input validation
//! and interpret responses for the rest of the app.

pub mod follow_status;
pub mod statistics;

pub use follow_status::*;
pub use statistics::*;
