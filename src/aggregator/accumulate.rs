//! Accumulate phase: per-group, per-application, per-library and
//! system-wide memory tables.

use super::enumerate::{enumerate, region_at, Enumeration};
use crate::snapshot::{RegionStats, Snapshot};
use crate::utils::error::ModelError;
use log::debug;
use serde::Serialize;

/// Dense 2-D table of counters, `rows × classes`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MemTable {
    rows: usize,
    cols: usize,
    cells: Vec<RegionStats>,
}

impl MemTable {
    pub fn new(rows: usize, cols: usize) -> Self {
        Self {
            rows,
            cols,
            cells: vec![RegionStats::default(); rows * cols],
        }
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn cell(&self, row: usize, col: usize) -> &RegionStats {
        &self.cells[row * self.cols + col]
    }

    pub fn cell_mut(&mut self, row: usize, col: usize) -> &mut RegionStats {
        &mut self.cells[row * self.cols + col]
    }

    /// All classes of one row
    pub fn row(&self, row: usize) -> &[RegionStats] {
        &self.cells[row * self.cols..(row + 1) * self.cols]
    }

    /// Store the sum of classes `1..` into class 0 of every row
    fn fill_totals(&mut self) {
        for row in 0..self.rows {
            let mut total = RegionStats::default();
            for col in 1..self.cols {
                total.sum_merge(self.cell(row, col));
            }
            *self.cell_mut(row, 0) = total;
        }
    }
}

/// Complete aggregation of one snapshot
///
/// **Public** - everything report writers need
///
/// Class index 0 of every table is the synthetic `total`.
#[derive(Debug, Clone)]
pub struct Analysis {
    pub enumeration: Enumeration,
    /// GroupMem[group][class]
    pub group_mem: MemTable,
    /// AppMem[application][class]
    pub app_mem: MemTable,
    /// LibMem[library][class], shared counters deduplicated per library
    pub lib_mem: MemTable,
    /// Library-deduplicated estimate of system usage per class
    pub system_estimate: Vec<RegionStats>,
    /// Plain sum of every application per class
    pub system_totals: Vec<RegionStats>,
    /// Heaviest single application per class, field by field
    pub app_max: Vec<RegionStats>,
}

impl Analysis {
    pub fn class_count(&self) -> usize {
        self.enumeration.classes.len()
    }

    /// Short table of the three system rollups
    pub fn summary(&self) -> String {
        let mut out = String::new();
        out.push_str(&format!(
            "{:<12} {:>12} {:>12} {:>12} {:>12} {:>12}\n",
            "class", "estimate-pss", "estimate-rss", "totals-rss", "max-rss", "max-pss"
        ));
        for (class, name) in self.enumeration.classes.iter().enumerate() {
            out.push_str(&format!(
                "{:<12} {:>12} {:>12} {:>12} {:>12} {:>12}\n",
                name,
                self.system_estimate[class].pss,
                self.system_estimate[class].rss,
                self.system_totals[class].rss,
                self.app_max[class].rss,
                self.app_max[class].pss,
            ));
        }
        out
    }
}

/// Build every table from an enumerated snapshot
///
/// **Public** - second phase of the aggregation engine
///
/// # Errors
/// * `ModelError::IdNotAssigned` - `enumeration` does not belong to
///   `snapshot`, or the snapshot changed after enumeration
pub fn accumulate(snapshot: &Snapshot, enumeration: Enumeration) -> Result<Analysis, ModelError> {
    let classes = enumeration.classes.len();
    let groups = enumeration.group_count();

    let mut group_mem = MemTable::new(groups, classes);
    let mut app_mem = MemTable::new(enumeration.applications.len(), classes);
    let mut lib_mem = MemTable::new(enumeration.libraries.len(), classes);

    // Step 1: regions into groups
    for r in enumeration.working() {
        let region = region_at(snapshot, *r)?;
        let group = region.group_id()?;
        let class = region.class_id()?;
        if group >= groups || class >= classes {
            return Err(ModelError::IdNotAssigned {
                uid: region.uid(),
                field: "group",
            });
        }
        group_mem.cell_mut(group, class).sum_merge(&region.stats);
    }

    // Step 2: groups into applications and libraries
    for group in 0..groups {
        let application = enumeration.group_application[group];
        let library = enumeration.group_library[group];
        for class in 1..classes {
            let stats = *group_mem.cell(group, class);
            app_mem.cell_mut(application, class).sum_merge(&stats);
            lib_mem.cell_mut(library, class).library_merge(&stats);
        }
    }

    // Step 3: per-row totals
    app_mem.fill_totals();
    lib_mem.fill_totals();

    // Step 4: worst application and naive sum
    let mut app_max = vec![RegionStats::default(); classes];
    let mut system_totals = vec![RegionStats::default(); classes];
    for application in 0..app_mem.rows() {
        for class in 1..classes {
            let stats = app_mem.cell(application, class);
            app_max[class].max_merge(stats);
            system_totals[class].sum_merge(stats);
        }
    }

    // Step 5: library-deduplicated estimate
    let mut system_estimate = vec![RegionStats::default(); classes];
    for library in 0..lib_mem.rows() {
        for class in 1..classes {
            system_estimate[class].sum_merge(lib_mem.cell(library, class));
        }
    }

    // Step 6: totals of the 1-D tables
    for table in [&mut system_estimate, &mut system_totals, &mut app_max] {
        let mut total = RegionStats::default();
        for stats in table.iter().skip(1) {
            total.sum_merge(stats);
        }
        if let Some(slot) = table.first_mut() {
            *slot = total;
        }
    }

    debug!(
        "Accumulated {}: {} groups, estimate pss {} kB, totals pss {} kB",
        snapshot.source(),
        groups,
        system_estimate.first().map(|s| s.pss).unwrap_or(0),
        system_totals.first().map(|s| s.pss).unwrap_or(0)
    );

    Ok(Analysis {
        enumeration,
        group_mem,
        app_mem,
        lib_mem,
        system_estimate,
        system_totals,
        app_max,
    })
}

/// Enumerate then accumulate
///
/// **Public** - convenience entry point for the whole engine
pub fn analyze(snapshot: &mut Snapshot) -> Result<Analysis, ModelError> {
    let enumeration = enumerate(snapshot)?;
    accumulate(snapshot, enumeration)
}
