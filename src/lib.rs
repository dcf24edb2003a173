//! smaps-filter
//!
//! Offline analysis of Linux `/proc/<pid>/smaps` captures: parse a capture
//! into a process forest, fold threads into their owning process, account
//! memory per application, library and region class, and compare several
//! captures against each other.
//!
//! This crate provides the core implementation for the `smaps-filter` CLI.
//!
//! ## Getting Started
//!
//! ```bash
//! smaps-filter analyze boot.cap --summary
//! smaps-filter diff -o changes.obj.html before.cap after.cap
//! ```

pub mod aggregator;
pub mod commands;
pub mod diff;
pub mod output;
pub mod parser;
pub mod snapshot;
pub mod utils;
