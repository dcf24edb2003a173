//! HTML diff table.
//!
//! Trimmed key cells are not written; the first cell of each run spans the
//! rows below it instead.

use super::write_text;
use crate::diff::DiffReport;
use crate::utils::error::OutputError;
use log::info;
use std::fmt::Write as _;
use std::path::Path;

fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

/// Render a diff as a standalone HTML page
pub fn render_diff_html(report: &DiffReport) -> String {
    let mut out = String::from(
        "<html><head><title>SMAPS DIFF</title></head><body>\n<h1>SMAPS DIFF</h1>\n<p>\n",
    );
    for (i, source) in report.sources.iter().enumerate() {
        let _ = writeln!(out, "CAP{} = {}<br>", i + 1, escape(source));
    }

    out.push_str("<table border=1>\n<tr>");
    for title in report.header() {
        let _ = write!(out, "<th>{}</th>", title);
    }
    out.push_str("</tr>\n");

    for (i, row) in report.rows.iter().enumerate() {
        out.push_str("<tr>");
        for (k, cell) in row.key.iter().enumerate() {
            // Covered by a rowspan from above
            let Some(text) = cell else {
                continue;
            };
            let span = 1 + report.rows[i + 1..]
                .iter()
                .take_while(|below| below.key.get(k).is_some_and(Option::is_none))
                .count();
            let align = if k == 1 { " align=right" } else { "" };
            if span > 1 {
                let _ = write!(
                    out,
                    "<td{} valign=top rowspan={}>{}</td>",
                    align,
                    span,
                    escape(text)
                );
            } else {
                let _ = write!(out, "<td{}>{}</td>", align, escape(text));
            }
        }
        let _ = write!(out, "<td>{}</td>", row.measure.label());
        for value in &row.values {
            let _ = write!(out, "<td align=right>{}</td>", value);
        }
        let _ = writeln!(out, "<td align=right>{:.1}</td></tr>", row.rank);
    }

    out.push_str("</table>\n</body>\n</html>\n");
    out
}

/// Write a diff as HTML
///
/// **Public** - diff output for `.html` paths
pub fn write_diff_html(report: &DiffReport, output_path: impl AsRef<Path>) -> Result<(), OutputError> {
    let output_path = output_path.as_ref();
    info!("Writing diff page to: {}", output_path.display());
    write_text(output_path, &render_diff_html(report))
}
