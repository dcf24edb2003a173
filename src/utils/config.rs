//! Configuration and constants for the CLI.

/// Tool name written to `generator` lines of CSV outputs
pub const TOOL_NAME: &str = "smaps-filter";

/// Tool version written to `generator` lines of CSV outputs
pub const TOOL_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Current JSON report schema version
pub const SCHEMA_VERSION: &str = "1.0.0";

/// Diff rows whose per-capture standard deviation stays below this
/// many kilobytes are not reported
pub const MIN_RANK_KB: f64 = 4.0;

/// Region classes seeded before enumeration; index 0 is the synthetic total
pub const CLASS_SEEDS: &[&str] = &["total", "code", "data", "heap", "anon", "stack"];

/// Class seeds for the diff engine (no synthetic total there)
pub const DIFF_CLASS_SEEDS: &[&str] = &["code", "data", "heap", "anon", "stack"];

/// Path given to regions without a backing object
pub const ANON_PATH: &str = "[anon]";

/// Name of a process until a `#Name:` line is seen
pub const UNNAMED_PROCESS: &str = "<noname>";

/// Name of the kernel thread daemon pruned before analysis
pub const KTHREADD_NAME: &str = "kthreadd";

// Per-region keys the kernel emits that carry nothing we account for
pub const IGNORED_STAT_KEYS: &[&str] = &["KernelPageSize", "MMUPageSize"];

// /proc/<pid>/status keys the capture tool copies but we do not use
pub const IGNORED_STATUS_KEYS: &[&str] = &[
    "State",
    "Tgid",
    "TracerPid",
    "Uid",
    "Gid",
    "FDSize",
    "Groups",
    "SigQ",
    "SigPnd",
    "ShdPnd",
    "SigBlk",
    "SigCgt",
    "SigIgn",
    "CapInh",
    "CapPrm",
    "CapEff",
    "CapBnd",
    "voluntary_ctxt_switches",
    "nonvoluntary_ctxt_switches",
];

// Output extensions per mode
pub const FLATTEN_EXTENSION: &str = "flat";
pub const NORMALIZE_EXTENSION: &str = "csv";
pub const ANALYZE_EXTENSION: &str = "json";
pub const APPVALS_EXTENSION: &str = "apps";
