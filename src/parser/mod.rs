//! Capture parsing.
//!
//! This module handles:
//! - Reading capture files into a [`crate::snapshot::Snapshot`]
//! - Recovering from malformed blocks and lines
//! - Collecting diagnostics for everything that was skipped

pub mod capture;
pub mod diagnostics;

// Re-export main types
pub use capture::{load_capture, parse_capture_str};
pub use diagnostics::{Diagnostic, Diagnostics};
