//! Normalize mode: one CSV row per region.

use super::{run_per_capture, FilterArgs};
use crate::output::write_normalized;
use anyhow::{Context, Result};

/// **Public** - called by execute for `Mode::Normalize`
pub fn execute_normalize(args: &FilterArgs) -> Result<()> {
    run_per_capture(args, |snapshot, output| {
        write_normalized(snapshot, output)
            .with_context(|| format!("Failed to write {}", output.display()))
    })
}
