//! Aggregation of a cleaned snapshot into memory tables.
//!
//! This module transforms a snapshot into:
//! - Dense ids for applications, classes, libraries and groups
//! - Per-group, per-application and per-library tables by class
//! - Three system-wide rollups with different sharing assumptions
//! - The per-application value table

pub mod accumulate;
pub mod appvals;
pub mod enumerate;

// Re-export main types and functions
pub use accumulate::{accumulate, analyze, Analysis, MemTable};
pub use appvals::{application_values, AppValues};
pub use enumerate::{compare_paths, enumerate, region_at, ApplicationInstance, Enumeration, RegionRef};
