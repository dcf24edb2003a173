//! Analyze mode implementation.
//!
//! The analyze mode:
//! 1. Prunes kernel threads from the cleaned snapshot
//! 2. Runs the aggregation engine
//! 3. Writes the JSON report
//! 4. Optionally prints the system table

use super::{run_per_capture, FilterArgs};
use crate::aggregator::analyze;
use crate::output::{build_analysis_report, write_analysis_report};
use crate::snapshot::prune_kernel_threads;
use anyhow::{Context, Result};
use log::{debug, info};

/// Analyze each capture into a JSON report
///
/// **Public** - called by execute for `Mode::Analyze`
///
/// # Errors
/// * Model invariant violations from the engine
/// * File write errors
pub fn execute_analyze(args: &FilterArgs) -> Result<()> {
    run_per_capture(args, |snapshot, output| {
        // Step 1: kernel threads own no regions
        let pruned = prune_kernel_threads(snapshot)?;
        debug!("Pruned {} kernel threads", pruned);

        // Step 2: enumerate and accumulate
        let analysis = analyze(snapshot)
            .with_context(|| format!("Failed to analyze {}", snapshot.source()))?;
        info!(
            "{}: {} applications, {} libraries, {} classes",
            snapshot.source(),
            analysis.enumeration.instances.len(),
            analysis.enumeration.libraries.len(),
            analysis.class_count()
        );

        // Step 3: report
        let report = build_analysis_report(snapshot, &analysis);
        write_analysis_report(&report, output)
            .with_context(|| format!("Failed to write {}", output.display()))?;

        // Step 4: summary
        if args.print_summary {
            println!("\n=== {} ===", snapshot.source());
            print!("{}", analysis.summary());
        }
        Ok(())
    })
}
