//! Core diff engine implementation.
//!
//! Builds one key-sorted table over all captures, ranks every key by the
//! variability of its measures across captures and keeps the keys that
//! move by at least the rank threshold.

use super::level::DiffLevel;
use super::schema::{DiffEntry, DiffKey, DiffReport, DiffRow, DiffValue, Measure};
use super::trim::trim_rows;
use crate::snapshot::{RegionStats, Snapshot};
use crate::utils::config::{DIFF_CLASS_SEEDS, MIN_RANK_KB};
use crate::utils::error::DiffError;
use crate::utils::symtab::SymbolTable;
use log::{debug, info};

/// Key-sorted accumulation table
///
/// **Public** - exposed for direct use and testing
#[derive(Debug, Clone)]
pub struct DiffTable {
    captures: usize,
    entries: Vec<DiffEntry>,
}

impl DiffTable {
    pub fn new(captures: usize) -> Self {
        Self {
            captures,
            entries: Vec::new(),
        }
    }

    /// Add `value` to the slot of `capture` under `key`
    ///
    /// A new key gets a fresh row with every slot zero before the add.
    pub fn insert(&mut self, key: DiffKey, capture: usize, value: &DiffValue) {
        let index = match self.entries.binary_search_by(|e| e.key.cmp(&key)) {
            Ok(index) => index,
            Err(index) => {
                self.entries.insert(
                    index,
                    DiffEntry {
                        key,
                        values: vec![DiffValue::default(); self.captures],
                    },
                );
                index
            }
        };
        if let Some(slot) = self.entries[index].values.get_mut(capture) {
            slot.add(value);
        }
    }

    pub fn entries(&self) -> &[DiffEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Population standard deviation
pub fn population_std_dev(values: &[u64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let n = values.len() as f64;
    let mean = values.iter().map(|v| *v as f64).sum::<f64>() / n;
    let variance = values
        .iter()
        .map(|v| {
            let d = *v as f64 - mean;
            d * d
        })
        .sum::<f64>()
        / n;
    variance.sqrt()
}

/// Per-measure deviations of one entry and their maximum
pub fn rank_entry(entry: &DiffEntry) -> ([f64; 3], f64) {
    let deviations = Measure::ALL.map(|m| population_std_dev(&measure_values(entry, m)));
    let rank = deviations.iter().copied().fold(0.0, f64::max);
    (deviations, rank)
}

fn measure_values(entry: &DiffEntry, measure: Measure) -> Vec<u64> {
    entry.values.iter().map(|v| v.get(measure)).collect()
}

fn region_value(stats: &RegionStats) -> DiffValue {
    DiffValue {
        private: stats.private(),
        shared: stats.shared(),
        clean: stats.clean(),
    }
}

/// Reverse lookup tables shared by every capture of one diff
struct DiffSymbols {
    applications: SymbolTable,
    classes: SymbolTable,
    paths: SymbolTable,
}

impl DiffSymbols {
    /// Enumerate over all captures, then renumber so ids follow key order
    fn collect(snapshots: &[Snapshot]) -> Self {
        let mut applications = SymbolTable::new();
        let mut classes = SymbolTable::seeded(DIFF_CLASS_SEEDS);
        let mut paths = SymbolTable::new();

        for snapshot in snapshots {
            for process in snapshot.processes() {
                applications.enumerate(process.name());
                for region in &process.regions {
                    classes.enumerate(region.mapping.class());
                    paths.enumerate(&region.mapping.path);
                }
            }
        }

        applications.renumber();
        classes.renumber();
        paths.renumber();

        Self {
            applications,
            classes,
            paths,
        }
    }
}

/// Accumulate every region of every capture into a diff table
///
/// Also returns the reverse lookup arrays for applications, classes and
/// paths, in that order.
fn accumulate_captures(snapshots: &[Snapshot], level: DiffLevel) -> (DiffTable, Vec<Vec<String>>) {
    let symbols = DiffSymbols::collect(snapshots);
    let mut table = DiffTable::new(snapshots.len());

    for (capture, snapshot) in snapshots.iter().enumerate() {
        // Instance index: rank among same-named processes, by pid
        let mut processes: Vec<(usize, i32, &crate::snapshot::Process)> = snapshot
            .processes()
            .map(|p| (symbols.applications.get(p.name(), 0), p.pid(), p))
            .collect();
        processes.sort_by_key(|(application, pid, _)| (*application, *pid));

        let mut previous: Option<usize> = None;
        let mut instance = 0;
        for (application, _, process) in processes {
            if previous == Some(application) {
                instance += 1;
            } else {
                previous = Some(application);
                instance = 0;
            }

            for region in &process.regions {
                let key = DiffKey {
                    application: level.includes_application().then_some(application),
                    instance: level.includes_instance().then_some(instance),
                    class: level
                        .includes_class()
                        .then(|| symbols.classes.get(region.mapping.class(), 0)),
                    path: level
                        .includes_path()
                        .then(|| symbols.paths.get(&region.mapping.path, 0)),
                };
                table.insert(key, capture, &region_value(&region.stats));
            }
        }
    }

    let names = vec![
        symbols.applications.names(),
        symbols.classes.names(),
        symbols.paths.names(),
    ];
    (table, names)
}

/// Compare captures
///
/// **Public** - main entry point of the diff engine
///
/// # Arguments
/// * `snapshots` - Cleaned captures, in column order
/// * `level` - Key columns to compare by
/// * `trim` - Leading key columns to blank when equal to the row above
///
/// # Errors
/// * `DiffError::NoCaptures` - `snapshots` is empty
///
/// # Example
/// ```ignore
/// let report = build_diff(&snapshots, DiffLevel::OBJECT, 4)?;
/// write_diff_csv(&report, "diff.obj.csv")?;
/// ```
pub fn build_diff(snapshots: &[Snapshot], level: DiffLevel, trim: usize) -> Result<DiffReport, DiffError> {
    if snapshots.is_empty() {
        return Err(DiffError::NoCaptures);
    }

    info!(
        "Comparing {} captures at level {}",
        snapshots.len(),
        level.value()
    );

    // Step 1: accumulate
    let (table, names) = accumulate_captures(snapshots, level);
    debug!("Diff table holds {} keys", table.len());

    // Step 2: rank and emit
    let mut rows = Vec::new();
    for entry in table.entries() {
        let (deviations, rank) = rank_entry(entry);
        if rank < MIN_RANK_KB {
            continue;
        }
        for (measure, deviation) in Measure::ALL.into_iter().zip(deviations) {
            if deviation < MIN_RANK_KB {
                continue;
            }
            rows.push(DiffRow {
                key: key_names(&entry.key, &names),
                measure,
                values: measure_values(entry, measure),
                rank: deviation,
            });
        }
    }

    // Step 3: blank repeated leading key columns
    let trim = trim.min(4);
    trim_rows(&mut rows, trim);

    info!("Diff produced {} rows", rows.len());

    Ok(DiffReport {
        sources: snapshots.iter().map(|s| s.source().to_string()).collect(),
        level,
        trim,
        rows,
    })
}

/// Resolve the enabled key fields to display strings
fn key_names(key: &DiffKey, names: &[Vec<String>]) -> Vec<Option<String>> {
    let lookup = |table: usize, id: usize| names[table].get(id).cloned().unwrap_or_default();

    let mut columns = Vec::with_capacity(4);
    if let Some(application) = key.application {
        columns.push(Some(lookup(0, application)));
    }
    if let Some(instance) = key.instance {
        columns.push(Some(instance.to_string()));
    }
    if let Some(class) = key.class {
        columns.push(Some(lookup(1, class)));
    }
    if let Some(path) = key.path {
        columns.push(Some(lookup(2, path)));
    }
    columns
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_population_std_dev() {
        assert_eq!(population_std_dev(&[10, 14]), 2.0);
        assert_eq!(population_std_dev(&[10, 20]), 5.0);
        assert_eq!(population_std_dev(&[7]), 0.0);
        assert_eq!(population_std_dev(&[]), 0.0);
    }

    #[test]
    fn test_insert_or_accumulate() {
        let mut table = DiffTable::new(2);
        let key_b = DiffKey {
            application: Some(1),
            ..Default::default()
        };
        let key_a = DiffKey {
            application: Some(0),
            ..Default::default()
        };
        let v = DiffValue {
            private: 1,
            shared: 2,
            clean: 3,
        };

        table.insert(key_b, 1, &v);
        table.insert(key_a, 0, &v);
        table.insert(key_b, 1, &v);

        assert_eq!(table.len(), 2);
        assert_eq!(table.entries()[0].key, key_a);
        assert_eq!(table.entries()[1].values[0], DiffValue::default());
        assert_eq!(table.entries()[1].values[1].clean, 6);
    }

    #[test]
    fn test_disabled_fields_sort_first() {
        let none = DiffKey::default();
        let some = DiffKey {
            application: Some(0),
            ..Default::default()
        };
        assert!(none < some);
    }

    #[test]
    fn test_rank_entry() {
        let entry = DiffEntry {
            key: DiffKey::default(),
            values: vec![
                DiffValue {
                    private: 10,
                    shared: 0,
                    clean: 100,
                },
                DiffValue {
                    private: 20,
                    shared: 0,
                    clean: 106,
                },
            ],
        };
        let (deviations, rank) = rank_entry(&entry);
        assert_eq!(deviations, [5.0, 0.0, 3.0]);
        assert_eq!(rank, 5.0);
    }

    #[test]
    fn test_build_diff_needs_captures() {
        assert!(matches!(
            build_diff(&[], DiffLevel::OBJECT, 0),
            Err(DiffError::NoCaptures)
        ));
    }
}
