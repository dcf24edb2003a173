//! Recoverable problems found while reading and cleaning captures.
//!
//! Every problem is logged as it happens and kept in a [`Diagnostics`]
//! value owned by the caller, so one run (or one test) can inspect exactly
//! what fired. Unknown keys are reported once per distinct key for the life
//! of the context.

use log::{debug, warn};
use std::collections::BTreeSet;

/// One recorded problem
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Diagnostic {
    /// `==>` line that does not name `/proc/<positive pid>/smaps`
    BadHeader { line: usize, text: String },
    /// Mapping header with unparseable fields or an empty range
    BadMapping { line: usize, text: String },
    /// Known key whose value is not a number
    BadValue { line: usize, key: String, value: String },
    /// Line that is neither a header, a mapping, nor `Key: value`
    Unrecognized { line: usize, text: String },
    /// `#Pid:` disagreeing with the block header
    PidMismatch { line: usize, header: i32, found: i32 },
    UnknownStatKey(String),
    UnknownStatusKey(String),
    ParentNotFound { pid: i32, ppid: i32 },
    /// Process whose parent chain looped back to itself
    ParentCycle { pid: i32, ppid: i32 },
    /// Capture without status lines; thread removal skipped
    LegacyFormat { source: String },
    ThreadCollapsed { parent: i32, child: i32 },
}

/// Diagnostics context passed through parsing and cleaning
#[derive(Debug, Default)]
pub struct Diagnostics {
    seen_stat_keys: BTreeSet<String>,
    seen_status_keys: BTreeSet<String>,
    records: Vec<Diagnostic>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything recorded so far, oldest first
    pub fn records(&self) -> &[Diagnostic] {
        &self.records
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Number of records matching `pred`
    pub fn count(&self, pred: impl Fn(&Diagnostic) -> bool) -> usize {
        self.records.iter().filter(|d| pred(d)).count()
    }

    pub fn bad_header(&mut self, line: usize, text: &str) {
        warn!("line {}: skipping block with bad header '{}'", line, text);
        self.records.push(Diagnostic::BadHeader {
            line,
            text: text.to_string(),
        });
    }

    pub fn bad_mapping(&mut self, line: usize, text: &str) {
        warn!("line {}: skipping bad mapping '{}'", line, text);
        self.records.push(Diagnostic::BadMapping {
            line,
            text: text.to_string(),
        });
    }

    pub fn bad_value(&mut self, line: usize, key: &str, value: &str) {
        warn!("line {}: bad value '{}' for {}", line, value, key);
        self.records.push(Diagnostic::BadValue {
            line,
            key: key.to_string(),
            value: value.to_string(),
        });
    }

    pub fn unrecognized(&mut self, line: usize, text: &str) {
        warn!("line {}: unrecognized line '{}'", line, text);
        self.records.push(Diagnostic::Unrecognized {
            line,
            text: text.to_string(),
        });
    }

    pub fn pid_mismatch(&mut self, line: usize, header: i32, found: i32) {
        warn!(
            "line {}: #Pid {} does not match block pid {}, ignored",
            line, found, header
        );
        self.records.push(Diagnostic::PidMismatch {
            line,
            header,
            found,
        });
    }

    /// Report an unknown region key the first time it is seen
    pub fn unknown_stat_key(&mut self, key: &str) {
        if self.seen_stat_keys.insert(key.to_string()) {
            warn!("unknown smaps key '{}' ignored", key);
            self.records.push(Diagnostic::UnknownStatKey(key.to_string()));
        }
    }

    /// Report an unknown status key the first time it is seen
    pub fn unknown_status_key(&mut self, key: &str) {
        if self.seen_status_keys.insert(key.to_string()) {
            warn!("unknown status key '{}' ignored", key);
            self.records.push(Diagnostic::UnknownStatusKey(key.to_string()));
        }
    }

    pub fn parent_not_found(&mut self, pid: i32, ppid: i32) {
        warn!("PPID {} of process {} not found", ppid, pid);
        self.records.push(Diagnostic::ParentNotFound { pid, ppid });
    }

    pub fn parent_cycle(&mut self, pid: i32, ppid: i32) {
        warn!("PPID {} of process {} forms a loop, moved to top level", ppid, pid);
        self.records.push(Diagnostic::ParentCycle { pid, ppid });
    }

    pub fn legacy_format(&mut self, source: &str) {
        warn!("{}: old style capture file, not removing threads", source);
        self.records.push(Diagnostic::LegacyFormat {
            source: source.to_string(),
        });
    }

    pub fn thread_collapsed(&mut self, parent: i32, child: i32, name: &str) {
        debug!("reparent: {} ({}) folded into {}", name, child, parent);
        self.records.push(Diagnostic::ThreadCollapsed { parent, child });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_keys_reported_once() {
        let mut diag = Diagnostics::new();
        diag.unknown_stat_key("Foo");
        diag.unknown_stat_key("Foo");
        diag.unknown_stat_key("Bar");
        diag.unknown_status_key("Foo");

        assert_eq!(
            diag.records(),
            &[
                Diagnostic::UnknownStatKey("Foo".into()),
                Diagnostic::UnknownStatKey("Bar".into()),
                Diagnostic::UnknownStatusKey("Foo".into()),
            ]
        );
    }

    #[test]
    fn test_count() {
        let mut diag = Diagnostics::new();
        assert!(diag.is_empty());
        diag.parent_not_found(5, 4);
        diag.parent_not_found(6, 4);
        diag.legacy_format("cap");
        assert_eq!(
            diag.count(|d| matches!(d, Diagnostic::ParentNotFound { .. })),
            2
        );
    }
}
