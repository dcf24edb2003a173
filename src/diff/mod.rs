//! Cross-capture diff and ranking.
//!
//! This module compares any number of cleaned captures and reports the
//! keys whose private, shared or clean memory varies the most between
//! them.
//!
//! # Example
//! ```ignore
//! use smaps_filter::diff::{build_diff, DiffLevel};
//!
//! let report = build_diff(&snapshots, DiffLevel::parse("obj"), 4)?;
//! for row in &report.rows {
//!     println!("{:?} {} {:?} {:.1}", row.key, row.measure.label(), row.values, row.rank);
//! }
//! ```

mod engine;
mod level;
mod schema;
mod trim;

// Public API exports
pub use engine::{build_diff, population_std_dev, rank_entry, DiffTable};
pub use level::DiffLevel;
pub use schema::{DiffEntry, DiffKey, DiffReport, DiffRow, DiffValue, Measure};
pub use trim::trim_rows;
