//! CSV writers.
//!
//! Every table starts with a `generator` line and a blank line, followed
//! by a header row and the data rows.

use super::write_text;
use crate::aggregator::{application_values, Analysis};
use crate::diff::DiffReport;
use crate::snapshot::{Process, Snapshot};
use crate::utils::config::{TOOL_NAME, TOOL_VERSION};
use crate::utils::error::OutputError;
use ::csv::{Writer, WriterBuilder};
use log::info;
use std::path::Path;

const NORMALIZED_HEADER: [&str; 25] = [
    "name", "pid", "ppid", "threads",
    "head", "tail", "prot", "offs", "node", "flag", "path",
    "size", "rss", "shacln", "shadty", "pricln", "pridty",
    "pss", "swap", "referenced", "anonymous", "locked",
    "pri", "sha", "cln",
];

const APPVALS_HEADER: [&str; 12] = [
    "name", "pid", "ppid", "threads", "pri", "sha", "cln", "rss", "size", "pss", "swap",
    "referenced",
];

/// Record writer that appends after the raw preamble lines
fn table_writer(preamble: String) -> Writer<Vec<u8>> {
    WriterBuilder::new().from_writer(preamble.into_bytes())
}

/// Flush the records and hand back the whole document
fn finish(writer: Writer<Vec<u8>>) -> Result<String, OutputError> {
    let bytes = writer
        .into_inner()
        .map_err(|e| OutputError::WriteFailed(e.into_error()))?;
    String::from_utf8(bytes).map_err(|e| {
        OutputError::WriteFailed(std::io::Error::new(std::io::ErrorKind::InvalidData, e))
    })
}

/// One row per region, processes in pid order
///
/// # Errors
/// Returns `OutputError` if a record cannot be encoded
pub fn render_normalized(snapshot: &Snapshot) -> Result<String, OutputError> {
    let mut processes: Vec<&Process> = snapshot.processes().collect();
    processes.sort_by_key(|p| p.pid());

    let mut writer = table_writer(format!("generator={} {}\n\n", TOOL_NAME, TOOL_VERSION));
    writer.write_record(NORMALIZED_HEADER)?;
    for process in processes {
        let id = &process.identity;
        for region in &process.regions {
            let m = &region.mapping;
            let s = &region.stats;
            let mut cells: Vec<String> = vec![
                id.name.clone(),
                id.pid.to_string(),
                id.ppid.to_string(),
                id.threads.to_string(),
                m.head.to_string(),
                m.tail.to_string(),
                m.prot.clone(),
                m.offset.to_string(),
                m.device.clone(),
                m.flags.to_string(),
                m.path.clone(),
            ];
            cells.extend(s.values().iter().map(u64::to_string));
            cells.push(s.private().to_string());
            cells.push(s.shared().to_string());
            cells.push(s.clean().to_string());
            writer.write_record(&cells)?;
        }
    }
    finish(writer)
}

/// Write the normalized region table
///
/// **Public** - output of the normalize mode
pub fn write_normalized(snapshot: &Snapshot, output_path: impl AsRef<Path>) -> Result<(), OutputError> {
    let output_path = output_path.as_ref();
    info!("Writing normalized table to: {}", output_path.display());
    write_text(output_path, &render_normalized(snapshot)?)
}

/// One row per application instance, heaviest first
///
/// # Errors
/// Returns `OutputError` if a record cannot be encoded
pub fn render_appvals(analysis: &Analysis) -> Result<String, OutputError> {
    let mut writer = table_writer(format!("generator = {} {}\n\n", TOOL_NAME, TOOL_VERSION));
    let header = APPVALS_HEADER
        .iter()
        .copied()
        .chain(analysis.enumeration.classes.iter().skip(1).map(String::as_str));
    writer.write_record(header)?;

    for row in application_values(analysis) {
        let t = &row.total;
        let mut cells: Vec<String> = vec![
            row.instance.name.clone(),
            row.instance.pid.to_string(),
            row.instance.ppid.to_string(),
            row.instance.threads.to_string(),
            t.private().to_string(),
            t.shared().to_string(),
            t.clean().to_string(),
            t.rss.to_string(),
            t.size.to_string(),
            t.pss.to_string(),
            t.swap.to_string(),
            t.referenced.to_string(),
        ];
        cells.extend(row.per_class.iter().map(u64::to_string));
        writer.write_record(&cells)?;
    }
    finish(writer)
}

/// Write the application value table
///
/// **Public** - output of the appvals mode
pub fn write_appvals(analysis: &Analysis, output_path: impl AsRef<Path>) -> Result<(), OutputError> {
    let output_path = output_path.as_ref();
    info!("Writing application values to: {}", output_path.display());
    write_text(output_path, &render_appvals(analysis)?)
}

/// Diff rows with capture labels above the header
///
/// Trimmed key cells are written empty.
///
/// # Errors
/// Returns `OutputError` if a record cannot be encoded
pub fn render_diff_csv(report: &DiffReport) -> Result<String, OutputError> {
    let mut preamble = format!("generator = {} {}\n", TOOL_NAME, TOOL_VERSION);
    for (i, source) in report.sources.iter().enumerate() {
        preamble.push_str(&format!("CAP{} = {}\n", i + 1, source));
    }
    preamble.push('\n');

    let mut writer = table_writer(preamble);
    writer.write_record(report.header())?;
    for row in &report.rows {
        let mut cells: Vec<String> = row
            .key
            .iter()
            .map(|k| k.clone().unwrap_or_default())
            .collect();
        cells.push(row.measure.label().to_string());
        cells.extend(row.values.iter().map(u64::to_string));
        cells.push(format!("{:.1}", row.rank));
        writer.write_record(&cells)?;
    }
    finish(writer)
}

/// Write a diff as CSV
///
/// **Public** - default diff output
pub fn write_diff_csv(report: &DiffReport, output_path: impl AsRef<Path>) -> Result<(), OutputError> {
    let output_path = output_path.as_ref();
    info!("Writing diff table to: {}", output_path.display());
    write_text(output_path, &render_diff_csv(report)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snapshot::{Mapping, ProcessIdentity};

    /// Records below the preamble and header
    fn records(text: &str, preamble_lines: usize) -> Vec<::csv::StringRecord> {
        let body = text.splitn(preamble_lines + 1, '\n').last().unwrap();
        ::csv::ReaderBuilder::new()
            .from_reader(body.as_bytes())
            .records()
            .collect::<Result<_, _>>()
            .unwrap()
    }

    #[test]
    fn test_normalized_header_columns() {
        let snap = Snapshot::new("empty");
        let text = render_normalized(&snap).unwrap();
        assert!(text.starts_with("generator=smaps-filter "));
        assert_eq!(text.lines().nth(1), Some(""));
        assert_eq!(text.lines().nth(2), Some(NORMALIZED_HEADER.join(",").as_str()));
    }

    #[test]
    fn test_awkward_fields_read_back() {
        let mut snap = Snapshot::new("odd");
        let id = snap.add_process(ProcessIdentity {
            name: "say \"hi\", bye".to_string(),
            ..ProcessIdentity::new(1)
        });
        let path = "/tmp/a\rb,\"c\".so";
        snap.add_region(id, Mapping::new(0, 4096, "r--p", 0, "00:00", 0, path))
            .unwrap();

        let text = render_normalized(&snap).unwrap();
        let rows = records(&text, 2);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].len(), NORMALIZED_HEADER.len());
        assert_eq!(&rows[0][0], "say \"hi\", bye");
        assert_eq!(&rows[0][10], path);
    }
}
