//! Per-application value table.

use super::accumulate::Analysis;
use super::enumerate::ApplicationInstance;
use crate::snapshot::RegionStats;
use serde::Serialize;
use std::cmp::Reverse;

/// One application instance with its totals
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AppValues {
    pub application: usize,
    pub instance: ApplicationInstance,
    /// AppMem[application][total]
    pub total: RegionStats,
    /// Resident kB per class, classes `1..` in ClassId order
    pub per_class: Vec<u64>,
}

/// Applications ordered heaviest first
///
/// Order: total Pss, PrivateDirty, SharedDirty, Rss, Size (all
/// descending), then ApplicationId.
pub fn application_values(analysis: &Analysis) -> Vec<AppValues> {
    let classes = analysis.class_count();
    let mut rows: Vec<AppValues> = analysis
        .enumeration
        .instances
        .iter()
        .enumerate()
        .map(|(application, instance)| AppValues {
            application,
            instance: instance.clone(),
            total: *analysis.app_mem.cell(application, 0),
            per_class: (1..classes)
                .map(|class| analysis.app_mem.cell(application, class).resident_split())
                .collect(),
        })
        .collect();

    rows.sort_by_key(|row| {
        (
            Reverse(row.total.pss),
            Reverse(row.total.private_dirty),
            Reverse(row.total.shared_dirty),
            Reverse(row.total.rss),
            Reverse(row.total.size),
            row.application,
        )
    });
    rows
}
