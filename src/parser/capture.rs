//! Capture file parser.
//!
//! A capture is the concatenation of `/proc/<pid>/smaps` files, each
//! preceded by a `==> /proc/<pid>/smaps <==` header and optionally by
//! `#Key: value` lines copied from `/proc/<pid>/status`.
//!
//! Parsing is line oriented and never fails on content. Malformed lines are
//! reported through [`Diagnostics`] and skipped.

use super::diagnostics::Diagnostics;
use crate::snapshot::{Mapping, ProcessId, ProcessIdentity, RegionStats, Snapshot};
use crate::utils::config::{IGNORED_STATUS_KEYS, IGNORED_STAT_KEYS};
use crate::utils::error::CaptureError;
use log::{debug, info};
use std::collections::HashMap;
use std::path::Path;

/// Read and parse one capture file
///
/// **Public** - main entry point for loading captures
///
/// # Arguments
/// * `path` - Capture file; its display form becomes the snapshot source
/// * `diag` - Diagnostics context that collects recoverable problems
///
/// # Errors
/// * `CaptureError::Io` - the file cannot be opened or read
///
/// # Example
/// ```ignore
/// let mut diag = Diagnostics::new();
/// let snapshot = load_capture("boot.cap", &mut diag)?;
/// ```
pub fn load_capture(
    path: impl AsRef<Path>,
    diag: &mut Diagnostics,
) -> Result<Snapshot, CaptureError> {
    let path = path.as_ref();
    info!("Loading capture: {}", path.display());

    let bytes = std::fs::read(path).map_err(|source| CaptureError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let text = String::from_utf8_lossy(&bytes);

    let snapshot = parse_capture_str(path.display().to_string(), &text, diag);
    info!(
        "Loaded {}: {} processes, {} regions ({:?} format)",
        path.display(),
        snapshot.len(),
        snapshot.region_count(),
        snapshot.format()
    );
    Ok(snapshot)
}

/// Parser cursor
#[derive(Debug, Default)]
struct Cursor {
    /// Process of the current block, with the pid from its header
    process: Option<(ProcessId, i32)>,
    /// Whether statistics lines have a region to land in
    region_open: bool,
}

/// Parse capture text into a snapshot
///
/// **Public** - in-memory entry point, used by load_capture and tests
///
/// Blocks with a repeated pid reopen the existing process so the flat list
/// stays unique by pid.
pub fn parse_capture_str(
    source: impl Into<String>,
    text: &str,
    diag: &mut Diagnostics,
) -> Snapshot {
    let mut snapshot = Snapshot::new(source);
    let mut by_pid: HashMap<i32, ProcessId> = HashMap::new();
    let mut cursor = Cursor::default();

    for (index, raw) in text.lines().enumerate() {
        let line_no = index + 1;
        let line = raw.trim_end();
        if line.trim_start().is_empty() {
            continue;
        }

        if line.starts_with("==>") {
            cursor.region_open = false;
            cursor.process = match parse_header(line) {
                Some(pid) => {
                    let id = *by_pid
                        .entry(pid)
                        .or_insert_with(|| snapshot.add_process(ProcessIdentity::new(pid)));
                    Some((id, pid))
                }
                None => {
                    diag.bad_header(line_no, line);
                    None
                }
            };
        } else if let Some(status) = line.strip_prefix('#') {
            let Some((id, header_pid)) = cursor.process else {
                continue;
            };
            snapshot.mark_modern();
            if let Some(process) = snapshot.process_mut(id) {
                parse_status_line(&mut process.identity, header_pid, status, line_no, diag);
            }
        } else if is_mapping_header(line) {
            let Some((id, _)) = cursor.process else {
                continue;
            };
            cursor.region_open = match parse_mapping(line) {
                Some(mapping) => snapshot.add_region(id, mapping).is_ok(),
                None => {
                    diag.bad_mapping(line_no, line);
                    false
                }
            };
        } else {
            if !cursor.region_open {
                continue;
            }
            let Some(region) = cursor
                .process
                .and_then(|(id, _)| snapshot.process_mut(id))
                .and_then(|p| p.regions.last_mut())
            else {
                continue;
            };
            parse_stat_line(&mut region.stats, line, line_no, diag);
        }
    }

    debug!(
        "Parsed {}: {} processes, {} diagnostics",
        snapshot.source(),
        snapshot.len(),
        diag.records().len()
    );
    snapshot
}

/// Pid of a `==> /proc/<pid>/smaps <==` header
///
/// **Private** - returns None unless the pid is a positive run of decimal digits
fn parse_header(line: &str) -> Option<i32> {
    let inner = line.strip_prefix("==>")?.trim();
    let inner = inner.strip_suffix("<==").unwrap_or(inner).trim();
    let digits = inner.strip_prefix("/proc/")?.strip_suffix("/smaps")?;
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let pid: i32 = digits.parse().ok()?;
    (pid > 0).then_some(pid)
}

/// Whether the text before the first `-` is all hex digits
fn is_mapping_header(line: &str) -> bool {
    match line.split_once('-') {
        Some((head, _)) => !head.is_empty() && head.chars().all(|c| c.is_ascii_hexdigit()),
        None => false,
    }
}

/// Split off the next whitespace-delimited token
fn next_token(s: &str) -> Option<(&str, &str)> {
    let s = s.trim_start();
    if s.is_empty() {
        return None;
    }
    let end = s.find(char::is_whitespace).unwrap_or(s.len());
    Some((&s[..end], &s[end..]))
}

/// Parse `<head>-<tail> <prot> <offset> <dev> <flags> [path]`
///
/// **Private** - None for malformed fields or an empty range
fn parse_mapping(line: &str) -> Option<Mapping> {
    let (range, rest) = next_token(line)?;
    let (prot, rest) = next_token(rest)?;
    let (offset, rest) = next_token(rest)?;
    let (device, rest) = next_token(rest)?;
    let (flags, path) = next_token(rest)?;

    let (head, tail) = range.split_once('-')?;
    let head = u64::from_str_radix(head, 16).ok()?;
    let tail = u64::from_str_radix(tail, 16).ok()?;
    if tail <= head {
        return None;
    }

    Some(Mapping::new(
        head,
        tail,
        prot,
        u64::from_str_radix(offset, 16).ok()?,
        device,
        flags.parse().ok()?,
        path,
    ))
}

/// First token of a `Key: N kB` or `#Key: N` value
fn leading_number<T: std::str::FromStr>(value: &str) -> Option<T> {
    value.split_whitespace().next()?.parse().ok()
}

/// Fold one `Key: N kB` line into region counters
fn parse_stat_line(stats: &mut RegionStats, line: &str, line_no: usize, diag: &mut Diagnostics) {
    let Some((key, value)) = line.split_once(':') else {
        diag.unrecognized(line_no, line);
        return;
    };
    let key = key.trim();

    if IGNORED_STAT_KEYS.contains(&key) {
        return;
    }
    let Some(field) = stats.field_mut(key) else {
        diag.unknown_stat_key(key);
        return;
    };
    match leading_number(value) {
        Some(n) => *field = n,
        None => diag.bad_value(line_no, key, value.trim()),
    }
}

/// Fold one status line (without its `#`) into a process identity
fn parse_status_line(
    identity: &mut ProcessIdentity,
    header_pid: i32,
    line: &str,
    line_no: usize,
    diag: &mut Diagnostics,
) {
    let Some((key, value)) = line.split_once(':') else {
        diag.unrecognized(line_no, line);
        return;
    };
    let key = key.trim();
    let value = value.trim();

    match key {
        "Name" => {
            // Login shells are reported as `-bash`
            let name = value.trim_start_matches('-');
            if !name.is_empty() {
                identity.name = name.to_string();
            }
        }
        "Pid" => match leading_number::<i32>(value) {
            Some(pid) if pid == header_pid => {}
            Some(pid) => diag.pid_mismatch(line_no, header_pid, pid),
            None => diag.bad_value(line_no, key, value),
        },
        "PPid" | "Threads" => match leading_number::<i32>(value) {
            Some(n) if key == "PPid" => identity.ppid = n,
            Some(n) => identity.threads = n,
            None => diag.bad_value(line_no, key, value),
        },
        _ => {
            if let Some(field) = identity.vm.field_mut(key) {
                match leading_number(value) {
                    Some(n) => *field = n,
                    None => diag.bad_value(line_no, key, value),
                }
            } else if !IGNORED_STATUS_KEYS.contains(&key) {
                diag.unknown_status_key(key);
            }
        }
    }
}
