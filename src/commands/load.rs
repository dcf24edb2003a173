//! Capture loading shared by every mode.

use crate::parser::{load_capture, Diagnostics};
use crate::snapshot::{build_hierarchy, collapse_threads, Snapshot};
use crate::utils::error::ModelError;
use log::{debug, error, info};
use std::path::{Path, PathBuf};

/// Link parents and fold threads into their owning process
///
/// **Public** - the cleaning pass every mode runs after parsing
///
/// # Errors
/// * `ModelError` - the snapshot already had a hierarchy
pub fn prepare_snapshot(snapshot: &mut Snapshot, diag: &mut Diagnostics) -> Result<(), ModelError> {
    build_hierarchy(snapshot, diag)?;
    let collapsed = collapse_threads(snapshot, diag)?;
    debug!(
        "{}: collapsed {} thread entries, {} processes remain",
        snapshot.source(),
        collapsed,
        snapshot.len()
    );
    Ok(())
}

/// Load and clean one capture
///
/// Read failures are logged and yield `None` so the caller can move on to
/// the next input.
pub fn load_one(path: &Path, diag: &mut Diagnostics) -> Result<Option<Snapshot>, ModelError> {
    let mut snapshot = match load_capture(path, diag) {
        Ok(snapshot) => snapshot,
        Err(e) => {
            error!("{}", e);
            return Ok(None);
        }
    };
    prepare_snapshot(&mut snapshot, diag)?;
    Ok(Some(snapshot))
}

/// Load and clean every readable capture, keeping input order
///
/// **Public** - used by the diff mode, which needs all captures at once
pub fn load_all(inputs: &[PathBuf], diag: &mut Diagnostics) -> Result<Vec<Snapshot>, ModelError> {
    let mut snapshots = Vec::with_capacity(inputs.len());
    for input in inputs {
        if let Some(snapshot) = load_one(input, diag)? {
            snapshots.push(snapshot);
        }
    }
    info!("Loaded {} of {} captures", snapshots.len(), inputs.len());
    Ok(snapshots)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_unreadable_input_is_skipped() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "==> /proc/1/smaps <==").unwrap();
        writeln!(file, "#Name: init").unwrap();

        let inputs = vec![
            PathBuf::from("/nonexistent/missing.cap"),
            file.path().to_path_buf(),
        ];
        let mut diag = Diagnostics::new();
        let snapshots = load_all(&inputs, &mut diag).unwrap();

        assert_eq!(snapshots.len(), 1);
        assert_eq!(snapshots[0].len(), 1);
        assert_eq!(snapshots[0].root_children().len(), 1);
    }
}
