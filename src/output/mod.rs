//! Output writers for snapshots, analyses and diffs.
//!
//! This module handles writing data to disk in various formats:
//! - Capture syntax (flattened snapshots)
//! - CSV tables (normalized regions, application values, diffs)
//! - JSON reports (analysis, diff)
//! - HTML diff tables

pub mod capture;
pub mod csv;
pub mod html;
pub mod json;

// Re-export main functions
pub use capture::{render_capture, write_capture};
pub use self::csv::{
    render_appvals, render_diff_csv, render_normalized, write_appvals, write_diff_csv,
    write_normalized,
};
pub use html::{render_diff_html, write_diff_html};
pub use json::{build_analysis_report, write_analysis_report, write_diff_report, AnalysisReport};

use crate::utils::error::OutputError;
use log::debug;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Write a fully rendered text document
///
/// **Private** - shared by the text writers
fn write_text(output_path: &Path, text: &str) -> Result<(), OutputError> {
    let mut writer = create_output(output_path)?;
    writer.write_all(text.as_bytes())?;
    writer.flush()?;
    debug!("Wrote {} bytes to {}", text.len(), output_path.display());
    Ok(())
}

/// Open an output file, creating parent directories as needed
///
/// **Private** - shared by every writer
fn create_output(output_path: &Path) -> Result<BufWriter<File>, OutputError> {
    validate_output_path(output_path)?;

    if let Some(parent) = output_path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            debug!("Creating parent directories: {}", parent.display());
            std::fs::create_dir_all(parent).map_err(|e| {
                OutputError::InvalidPath(format!(
                    "Cannot create directory {}: {}",
                    parent.display(),
                    e
                ))
            })?;
        }
    }

    let file = File::create(output_path).map_err(OutputError::WriteFailed)?;
    Ok(BufWriter::new(file))
}

/// Validate that output path is writable
///
/// **Private** - internal validation
fn validate_output_path(path: &Path) -> Result<(), OutputError> {
    if path.as_os_str().is_empty() {
        return Err(OutputError::InvalidPath("Path is empty".to_string()));
    }

    if path.is_dir() {
        return Err(OutputError::InvalidPath(format!(
            "Path is a directory: {}",
            path.display()
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_output_path_empty() {
        assert!(validate_output_path(Path::new("")).is_err());
    }

    #[test]
    fn test_validate_output_path_directory() {
        let temp_dir = tempfile::tempdir().unwrap();
        assert!(validate_output_path(temp_dir.path()).is_err());
    }

    #[test]
    fn test_write_creates_parent_dirs() {
        let temp_dir = tempfile::tempdir().unwrap();
        let nested = temp_dir.path().join("nested/dirs/out.txt");
        write_text(&nested, "hello\n").unwrap();
        assert_eq!(std::fs::read_to_string(&nested).unwrap(), "hello\n");
    }
}
