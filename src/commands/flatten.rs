//! Flatten mode: cleaned captures in capture syntax.

use super::{run_per_capture, FilterArgs};
use crate::output::write_capture;
use anyhow::{Context, Result};

/// Write each capture back out with threads folded into their process
///
/// **Public** - called by execute for `Mode::Flatten`
pub fn execute_flatten(args: &FilterArgs) -> Result<()> {
    run_per_capture(args, |snapshot, output| {
        write_capture(snapshot, output)
            .with_context(|| format!("Failed to write {}", output.display()))
    })
}
