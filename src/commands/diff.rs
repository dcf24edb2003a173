//! Diff mode implementation.
//!
//! All inputs are loaded first, then compared in one table. The writer is
//! chosen from the output extension: `.html`, `.json`, anything else CSV.

use super::{load_all, FilterArgs};
use crate::diff::{build_diff, DiffLevel, DiffReport};
use crate::output::{write_diff_csv, write_diff_html, write_diff_report};
use crate::parser::Diagnostics;
use anyhow::{Context, Result};
use log::{info, warn};
use std::path::Path;

/// Output writer picked by extension
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiffFormat {
    Csv,
    Html,
    Json,
}

impl DiffFormat {
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some("html") => DiffFormat::Html,
            Some("json") => DiffFormat::Json,
            _ => DiffFormat::Csv,
        }
    }
}

/// Compare every input capture
///
/// **Public** - called by execute for `Mode::Diff`
///
/// # Errors
/// * Missing output path (normally caught by validate_args)
/// * No input could be loaded
/// * File write errors
pub fn execute_diff(args: &FilterArgs) -> Result<()> {
    let output = args
        .output
        .as_deref()
        .context("The diff mode needs an output path")?;

    // Step 1: load
    let mut diag = Diagnostics::new();
    let snapshots = load_all(&args.inputs, &mut diag)?;
    if snapshots.len() < 2 {
        warn!(
            "Diffing {} capture(s); at least two are needed for a comparison",
            snapshots.len()
        );
    }

    // Step 2: compare
    let level = args
        .level
        .unwrap_or_else(|| DiffLevel::from_output_path(output));
    info!(
        "Diff level {}, trim level {}",
        level.value(),
        args.trim.value()
    );
    let report = build_diff(&snapshots, level, args.trim.value())
        .context("Failed to build diff")?;
    info!("{} rows above the rank threshold", report.rows.len());

    // Step 3: write
    write_report(&report, output)
}

/// **Private** - dispatch on the output format
fn write_report(report: &DiffReport, output: &Path) -> Result<()> {
    let written = match DiffFormat::from_path(output) {
        DiffFormat::Html => write_diff_html(report, output),
        DiffFormat::Json => write_diff_report(report, output),
        DiffFormat::Csv => write_diff_csv(report, output),
    };
    written.with_context(|| format!("Failed to write {}", output.display()))
}
