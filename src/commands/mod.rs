//! CLI command implementations.
//!
//! Each mode is implemented in its own module. Commands orchestrate the
//! parser, the engines and the writers; library errors become `anyhow`
//! errors with context here.

pub mod analyze;
pub mod appvals;
pub mod diff;
pub mod flatten;
pub mod load;
pub mod models;
pub mod normalize;

// Re-export main command functions
pub use analyze::execute_analyze;
pub use appvals::execute_appvals;
pub use diff::execute_diff;
pub use flatten::execute_flatten;
pub use load::{load_all, load_one, prepare_snapshot};
pub use models::{FilterArgs, Mode};
pub use normalize::execute_normalize;

use crate::parser::Diagnostics;
use crate::snapshot::Snapshot;
use anyhow::{bail, Result};
use log::{error, info};
use std::path::Path;
use std::time::Instant;

/// Validate arguments before any input is read
///
/// **Public** - called by main.rs before execute
///
/// # Errors
/// * No input files
/// * Diff mode without an output path
/// * A forced output path shared by several inputs of a per-file mode
pub fn validate_args(args: &FilterArgs) -> Result<()> {
    if args.inputs.is_empty() {
        bail!("No capture files given");
    }

    match args.mode {
        Mode::Diff if args.output.is_none() => {
            bail!("The diff mode needs an output path (-o)");
        }
        Mode::Diff => {}
        _ if args.output.is_some() && args.inputs.len() > 1 => {
            bail!(
                "A forced output path takes exactly one input, {} given",
                args.inputs.len()
            );
        }
        _ => {}
    }

    Ok(())
}

/// Run the selected mode
///
/// **Public** - main entry point called from main.rs
pub fn execute(args: &FilterArgs) -> Result<()> {
    let start_time = Instant::now();
    info!("Running {} on {} capture(s)", args.mode, args.inputs.len());

    match args.mode {
        Mode::Flatten => execute_flatten(args)?,
        Mode::Normalize => execute_normalize(args)?,
        Mode::Analyze => execute_analyze(args)?,
        Mode::Appvals => execute_appvals(args)?,
        Mode::Diff => execute_diff(args)?,
    }

    info!("Done in {:.2?}", start_time.elapsed());
    Ok(())
}

/// Load, clean and hand each input to `process` with its output path
///
/// **Private** - shared by the per-file modes
///
/// Unreadable inputs are skipped. A derived output path that equals its
/// input is refused so a capture is never overwritten.
fn run_per_capture<F>(args: &FilterArgs, mut process: F) -> Result<()>
where
    F: FnMut(&mut Snapshot, &Path) -> Result<()>,
{
    let mut diag = Diagnostics::new();
    let mut written = 0;

    for input in &args.inputs {
        let output = args.output_for(input);
        if output == *input {
            error!(
                "Output path {} equals its input, skipping",
                output.display()
            );
            continue;
        }

        let Some(mut snapshot) = load_one(input, &mut diag)? else {
            continue;
        };
        process(&mut snapshot, &output)?;
        written += 1;
    }

    info!(
        "Wrote {} of {} outputs ({} diagnostics)",
        written,
        args.inputs.len(),
        diag.records().len()
    );
    Ok(())
}
