//! JSON report writers.
//!
//! Analyses and diffs are written pretty-printed with a schema version and
//! a generation timestamp.

use super::create_output;
use crate::aggregator::Analysis;
use crate::diff::DiffReport;
use crate::snapshot::{CaptureFormat, RegionStats, Snapshot};
use crate::utils::config::{SCHEMA_VERSION, TOOL_NAME, TOOL_VERSION};
use crate::utils::error::OutputError;
use chrono::Utc;
use log::info;
use serde::Serialize;
use std::io::Write;
use std::path::Path;

/// Per-class counters of one application instance
#[derive(Debug, Clone, Serialize)]
pub struct ApplicationReport {
    pub name: String,
    pub pid: i32,
    pub ppid: i32,
    pub threads: i32,
    /// Indexed like `AnalysisReport::classes`
    pub classes: Vec<RegionStats>,
}

/// Per-class counters of one backing object
#[derive(Debug, Clone, Serialize)]
pub struct LibraryReport {
    pub path: String,
    pub classes: Vec<RegionStats>,
}

/// Serializable view of an analysis
///
/// **Public** - output of the analyze mode
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisReport {
    pub version: String,
    pub generator: String,
    pub source: String,
    pub format: CaptureFormat,
    /// Class names; index 0 is `total`
    pub classes: Vec<String>,
    pub system_estimate: Vec<RegionStats>,
    pub system_totals: Vec<RegionStats>,
    pub app_max: Vec<RegionStats>,
    pub applications: Vec<ApplicationReport>,
    pub libraries: Vec<LibraryReport>,
    pub generated_at: String,
}

/// Build the report for one analysed snapshot
pub fn build_analysis_report(snapshot: &Snapshot, analysis: &Analysis) -> AnalysisReport {
    let enumeration = &analysis.enumeration;

    let applications = enumeration
        .instances
        .iter()
        .enumerate()
        .map(|(application, instance)| ApplicationReport {
            name: instance.name.clone(),
            pid: instance.pid,
            ppid: instance.ppid,
            threads: instance.threads,
            classes: analysis.app_mem.row(application).to_vec(),
        })
        .collect();

    let libraries = enumeration
        .libraries
        .iter()
        .enumerate()
        .map(|(library, path)| LibraryReport {
            path: path.clone(),
            classes: analysis.lib_mem.row(library).to_vec(),
        })
        .collect();

    AnalysisReport {
        version: SCHEMA_VERSION.to_string(),
        generator: format!("{} {}", TOOL_NAME, TOOL_VERSION),
        source: snapshot.source().to_string(),
        format: snapshot.format(),
        classes: enumeration.classes.clone(),
        system_estimate: analysis.system_estimate.clone(),
        system_totals: analysis.system_totals.clone(),
        app_max: analysis.app_max.clone(),
        applications,
        libraries,
        generated_at: Utc::now().to_rfc3339(),
    }
}

/// Serialize any report pretty-printed
///
/// **Private** - shared by the JSON writers
fn write_json<T: Serialize>(value: &T, output_path: &Path) -> Result<(), OutputError> {
    let mut writer = create_output(output_path)?;
    serde_json::to_writer_pretty(&mut writer, value).map_err(OutputError::SerializationFailed)?;
    writer.write_all(b"\n")?;
    writer.flush()?;

    info!(
        "Report written successfully ({} bytes)",
        calculate_file_size(output_path)
    );
    Ok(())
}

/// Write an analysis report
///
/// **Public** - main entry point for JSON analysis output
///
/// # Errors
/// * `OutputError::WriteFailed` - I/O error during write
/// * `OutputError::SerializationFailed` - JSON serialization error
/// * `OutputError::InvalidPath` - Path cannot be created or is invalid
pub fn write_analysis_report(
    report: &AnalysisReport,
    output_path: impl AsRef<Path>,
) -> Result<(), OutputError> {
    let output_path = output_path.as_ref();
    info!("Writing analysis to: {}", output_path.display());
    write_json(report, output_path)
}

#[derive(Serialize)]
struct DiffDocument<'a> {
    version: &'static str,
    generator: String,
    #[serde(flatten)]
    report: &'a DiffReport,
    generated_at: String,
}

/// Write a diff report
///
/// **Public** - diff output for `.json` paths
pub fn write_diff_report(report: &DiffReport, output_path: impl AsRef<Path>) -> Result<(), OutputError> {
    let output_path = output_path.as_ref();
    info!("Writing diff report to: {}", output_path.display());
    let document = DiffDocument {
        version: SCHEMA_VERSION,
        generator: format!("{} {}", TOOL_NAME, TOOL_VERSION),
        report,
        generated_at: Utc::now().to_rfc3339(),
    };
    write_json(&document, output_path)
}

/// Calculate file size in bytes
///
/// **Private** - internal utility
fn calculate_file_size(path: &Path) -> u64 {
    std::fs::metadata(path).map(|m| m.len()).unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregator::analyze;
    use crate::diff::{DiffLevel, DiffRow, Measure};
    use tempfile::NamedTempFile;

    #[test]
    fn test_write_diff_report() {
        let report = DiffReport {
            sources: vec!["a".into(), "b".into()],
            level: DiffLevel::APPLICATION,
            trim: 0,
            rows: vec![DiffRow {
                key: vec![Some("app".into())],
                measure: Measure::Shared,
                values: vec![0, 10],
                rank: 5.0,
            }],
        };
        let temp_file = NamedTempFile::new().unwrap();
        write_diff_report(&report, temp_file.path()).unwrap();

        let text = std::fs::read_to_string(temp_file.path()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value["version"], SCHEMA_VERSION);
        assert_eq!(value["level"], 1);
        assert_eq!(value["rows"][0]["measure"], "sha");
        assert_eq!(value["rows"][0]["values"][1], 10);
    }

    #[test]
    fn test_analysis_report_of_empty_snapshot() {
        let mut snap = Snapshot::new("empty.cap");
        let analysis = analyze(&mut snap).unwrap();
        let report = build_analysis_report(&snap, &analysis);

        assert_eq!(report.classes[0], "total");
        assert!(report.applications.is_empty());

        let temp_file = NamedTempFile::new().unwrap();
        write_analysis_report(&report, temp_file.path()).unwrap();
        let value: serde_json::Value =
            serde_json::from_reader(std::fs::File::open(temp_file.path()).unwrap()).unwrap();
        assert_eq!(value["source"], "empty.cap");
        assert_eq!(value["format"], "legacy");
    }
}
