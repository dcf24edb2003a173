//! Capture-syntax writer.
//!
//! Renders a snapshot back into the format the parser reads, one block
//! per process in pid order. Used for the `flatten` mode, which writes
//! captures with threads already folded away.

use super::write_text;
use crate::snapshot::{Process, Snapshot, VM_KEYS};
use crate::utils::error::OutputError;
use log::info;
use std::fmt::Write as _;
use std::path::Path;

/// Render a snapshot in capture syntax
pub fn render_capture(snapshot: &Snapshot) -> String {
    let mut processes: Vec<&Process> = snapshot.processes().collect();
    processes.sort_by_key(|p| p.pid());

    let mut out = String::new();
    for process in processes {
        render_process(&mut out, process);
    }
    out
}

fn render_process(out: &mut String, process: &Process) {
    let id = &process.identity;

    // Writing to a String cannot fail
    let _ = writeln!(out, "==> /proc/{}/smaps <==", id.pid);
    let _ = writeln!(out, "#Name: {}", id.name);
    let _ = writeln!(out, "#Pid: {}", id.pid);
    let _ = writeln!(out, "#PPid: {}", id.ppid);
    let _ = writeln!(out, "#Threads: {}", id.threads);

    if id.vm.any_nonzero() {
        for (key, value) in VM_KEYS.iter().zip(id.vm.values()) {
            let _ = writeln!(out, "#{}: {}", key, value);
        }
    }

    for region in &process.regions {
        let m = &region.mapping;
        let _ = writeln!(
            out,
            "{:08x}-{:08x} {} {:08x} {} {:<10} {}",
            m.head, m.tail, m.prot, m.offset, m.device, m.flags, m.path
        );
        for (key, value) in region.stats.entries() {
            let _ = writeln!(out, "{:<14} {:>8} kB", format!("{}:", key), value);
        }
    }
    out.push('\n');
}

/// Write a snapshot in capture syntax
///
/// **Public** - output of the flatten mode
///
/// # Errors
/// * `OutputError::WriteFailed` - I/O error during write
/// * `OutputError::InvalidPath` - Path cannot be created or is invalid
pub fn write_capture(snapshot: &Snapshot, output_path: impl AsRef<Path>) -> Result<(), OutputError> {
    let output_path = output_path.as_ref();
    info!("Writing flattened capture to: {}", output_path.display());
    write_text(output_path, &render_capture(snapshot))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snapshot::{Mapping, ProcessIdentity};

    #[test]
    fn test_render_block_layout() {
        let mut snap = Snapshot::new("t");
        let id = snap.add_process(ProcessIdentity::new(12));
        snap.add_region(
            id,
            Mapping::new(0x400000, 0x401000, "r-xp", 0, "08:01", 1234, "/bin/true"),
        )
        .unwrap();
        snap.get_mut(id).unwrap().regions[0].stats.rss = 4;

        let text = render_capture(&snap);
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines[0], "==> /proc/12/smaps <==");
        assert_eq!(lines[1], "#Name: <noname>");
        assert_eq!(lines[4], "#Threads: 0");
        assert_eq!(
            lines[5],
            "00400000-00401000 r-xp 00000000 08:01 1234       /bin/true"
        );
        assert_eq!(lines[7], "Rss:                  4 kB");
        assert_eq!(lines.len(), 5 + 1 + 11 + 1);
        assert_eq!(lines[17], "");
    }

    #[test]
    fn test_vm_lines_only_when_present() {
        let mut snap = Snapshot::new("t");
        let id = snap.add_process(ProcessIdentity::new(1));
        assert!(!render_capture(&snap).contains("#VmPeak"));

        snap.get_mut(id).unwrap().identity.vm.pte = 8;
        let text = render_capture(&snap);
        assert!(text.contains("#VmPeak: 0\n"));
        assert!(text.contains("#VmPTE: 8\n"));
    }
}
