//! Error types for the entire application.
//!
//! We use `thiserror` for library-style errors with custom types,
//! and `anyhow` for application-level error propagation in main.rs and commands.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while loading a capture file
///
/// Only whole-file failures end up here. Malformed blocks inside a
/// capture are recovered by the parser and reported through
/// [`crate::parser::Diagnostics`].
#[derive(Error, Debug)]
pub enum CaptureError {
    #[error("Cannot read capture {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Violated data-model invariants
///
/// These are programming-contract failures. They abort the current run
/// instead of being silently repaired.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ModelError {
    #[error("Process {pid} was assigned a parent twice")]
    ParentAlreadyAssigned { pid: i32 },

    #[error("Region {uid} has no {field} id; enumeration has not run")]
    IdNotAssigned { uid: usize, field: &'static str },

    #[error("Group {group} maps to both app {app_a}/lib {lib_a} and app {app_b}/lib {lib_b}")]
    GroupConflict {
        group: usize,
        app_a: usize,
        lib_a: usize,
        app_b: usize,
        lib_b: usize,
    },

    #[error("Process slot {0} is vacant")]
    VacantSlot(usize),
}

/// Errors that can occur during file output
#[derive(Error, Debug)]
pub enum OutputError {
    #[error("Failed to write file: {0}")]
    WriteFailed(#[from] std::io::Error),

    #[error("Failed to serialize JSON: {0}")]
    SerializationFailed(#[from] serde_json::Error),

    #[error("Failed to write CSV record: {0}")]
    CsvFailed(#[from] csv::Error),

    #[error("Invalid output path: {0}")]
    InvalidPath(String),
}

/// Errors that can occur while building a cross-capture diff
#[derive(Error, Debug)]
pub enum DiffError {
    #[error("No captures to compare")]
    NoCaptures,
}
