//! Diff data structures.

use super::level::DiffLevel;
use serde::Serialize;

/// Comparison key; fields beyond the diff level stay `None`
///
/// Ordering is field by field in declaration order, `None` first.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DiffKey {
    pub application: Option<usize>,
    pub instance: Option<usize>,
    pub class: Option<usize>,
    pub path: Option<usize>,
}

/// The three compared measures of one capture, in kB
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DiffValue {
    pub private: u64,
    pub shared: u64,
    pub clean: u64,
}

impl DiffValue {
    pub fn add(&mut self, other: &DiffValue) {
        self.private = self.private.saturating_add(other.private);
        self.shared = self.shared.saturating_add(other.shared);
        self.clean = self.clean.saturating_add(other.clean);
    }

    pub fn get(&self, measure: Measure) -> u64 {
        match measure {
            Measure::Private => self.private,
            Measure::Shared => self.shared,
            Measure::Clean => self.clean,
        }
    }
}

/// Compared measure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Measure {
    /// Private dirty
    #[serde(rename = "pri")]
    Private,
    /// Shared dirty
    #[serde(rename = "sha")]
    Shared,
    /// Clean, shared or private
    #[serde(rename = "cln")]
    Clean,
}

impl Measure {
    pub const ALL: [Measure; 3] = [Measure::Private, Measure::Shared, Measure::Clean];

    pub fn label(self) -> &'static str {
        match self {
            Measure::Private => "pri",
            Measure::Shared => "sha",
            Measure::Clean => "cln",
        }
    }
}

/// Accumulated row: one key with a value slot per capture
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiffEntry {
    pub key: DiffKey,
    pub values: Vec<DiffValue>,
}

/// One emitted row
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DiffRow {
    /// Names of the enabled key columns; `None` where trimmed
    pub key: Vec<Option<String>>,
    pub measure: Measure,
    /// The measure in every capture, in capture order
    pub values: Vec<u64>,
    /// Population standard deviation of `values`
    pub rank: f64,
}

/// Complete diff result
///
/// **Public** - handed to the CSV, HTML and JSON writers
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DiffReport {
    /// Capture labels, in input order
    pub sources: Vec<String>,
    pub level: DiffLevel,
    pub trim: usize,
    pub rows: Vec<DiffRow>,
}

impl DiffReport {
    /// Key column titles followed by `Value`, one `CAPn` per capture, `RANK`
    pub fn header(&self) -> Vec<String> {
        let mut header: Vec<String> = self
            .level
            .column_titles()
            .iter()
            .map(|t| t.to_string())
            .collect();
        header.push("Value".to_string());
        header.extend((1..=self.sources.len()).map(|i| format!("CAP{}", i)));
        header.push("RANK".to_string());
        header
    }
}
