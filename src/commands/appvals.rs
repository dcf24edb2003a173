//! Appvals mode: per-application value table.

use super::{run_per_capture, FilterArgs};
use crate::aggregator::analyze;
use crate::output::write_appvals;
use crate::snapshot::prune_kernel_threads;
use anyhow::{Context, Result};
use log::debug;

/// **Public** - called by execute for `Mode::Appvals`
pub fn execute_appvals(args: &FilterArgs) -> Result<()> {
    run_per_capture(args, |snapshot, output| {
        let pruned = prune_kernel_threads(snapshot)?;
        debug!("Pruned {} kernel threads", pruned);

        let analysis = analyze(snapshot)
            .with_context(|| format!("Failed to analyze {}", snapshot.source()))?;
        write_appvals(&analysis, output)
            .with_context(|| format!("Failed to write {}", output.display()))
    })
}
