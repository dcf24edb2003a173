//! Processes, their identity and their region records.

use super::mapping::Mapping;
use super::stats::RegionStats;
use crate::utils::config::UNNAMED_PROCESS;
use crate::utils::error::ModelError;
use serde::Serialize;

/// Status keys of the ten virtual-memory counters, in field order
pub const VM_KEYS: [&str; 10] = [
    "VmPeak", "VmSize", "VmLck", "VmHWM", "VmRSS", "VmData", "VmStk", "VmExe", "VmLib", "VmPTE",
];

/// Virtual-memory counters copied from `/proc/<pid>/status`, in kB
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct VmCounters {
    pub peak: u64,
    pub size: u64,
    pub locked: u64,
    pub hwm: u64,
    pub rss: u64,
    pub data: u64,
    pub stack: u64,
    pub exe: u64,
    pub lib: u64,
    pub pte: u64,
}

impl VmCounters {
    /// Counter values in `VM_KEYS` order
    pub fn values(&self) -> [u64; 10] {
        [
            self.peak, self.size, self.locked, self.hwm, self.rss, self.data, self.stack,
            self.exe, self.lib, self.pte,
        ]
    }

    /// Mutable counter for a status key such as `VmRSS`
    pub fn field_mut(&mut self, key: &str) -> Option<&mut u64> {
        let field = match key {
            "VmPeak" => &mut self.peak,
            "VmSize" => &mut self.size,
            "VmLck" => &mut self.locked,
            "VmHWM" => &mut self.hwm,
            "VmRSS" => &mut self.rss,
            "VmData" => &mut self.data,
            "VmStk" => &mut self.stack,
            "VmExe" => &mut self.exe,
            "VmLib" => &mut self.lib,
            "VmPTE" => &mut self.pte,
            _ => return None,
        };
        Some(field)
    }

    pub fn any_nonzero(&self) -> bool {
        self.values().iter().any(|v| *v != 0)
    }
}

/// Who a process is, as reported by its status block
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProcessIdentity {
    pub name: String,
    pub pid: i32,
    pub ppid: i32,
    pub threads: i32,
    pub vm: VmCounters,
}

impl ProcessIdentity {
    /// Identity with only the pid known
    pub fn new(pid: i32) -> Self {
        Self {
            name: UNNAMED_PROCESS.to_string(),
            pid,
            ppid: 0,
            threads: 0,
            vm: VmCounters::default(),
        }
    }
}

/// Ids assigned to a region by one enumeration pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct RegionIds {
    application: Option<usize>,
    library: Option<usize>,
    class: Option<usize>,
    group: Option<usize>,
}

/// One mapping with its counters
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegionRecord {
    pub mapping: Mapping,
    pub stats: RegionStats,
    uid: usize,
    ids: RegionIds,
}

impl RegionRecord {
    pub fn new(uid: usize, mapping: Mapping) -> Self {
        Self {
            mapping,
            stats: RegionStats::default(),
            uid,
            ids: RegionIds::default(),
        }
    }

    /// Creation-order id, unique within its snapshot
    pub fn uid(&self) -> usize {
        self.uid
    }

    fn require(&self, id: Option<usize>, field: &'static str) -> Result<usize, ModelError> {
        id.ok_or(ModelError::IdNotAssigned {
            uid: self.uid,
            field,
        })
    }

    pub fn application_id(&self) -> Result<usize, ModelError> {
        self.require(self.ids.application, "application")
    }

    pub fn library_id(&self) -> Result<usize, ModelError> {
        self.require(self.ids.library, "library")
    }

    pub fn class_id(&self) -> Result<usize, ModelError> {
        self.require(self.ids.class, "class")
    }

    pub fn group_id(&self) -> Result<usize, ModelError> {
        self.require(self.ids.group, "group")
    }

    pub(crate) fn assign_application(&mut self, application: usize, class: usize) {
        self.ids.application = Some(application);
        self.ids.class = Some(class);
    }

    pub(crate) fn assign_library(&mut self, library: usize, group: usize) {
        self.ids.library = Some(library);
        self.ids.group = Some(group);
    }

    /// Forget ids from a previous enumeration pass
    pub(crate) fn clear_ids(&mut self) {
        self.ids = RegionIds::default();
    }
}

/// Stable arena index of a process inside its snapshot
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ProcessId(pub(crate) usize);

impl ProcessId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// Parent link of a process
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParentRef {
    /// The synthetic root of the forest
    Root,
    Process(ProcessId),
}

/// One process of a capture
#[derive(Debug, Clone)]
pub struct Process {
    pub identity: ProcessIdentity,
    /// Regions in capture order
    pub regions: Vec<RegionRecord>,
    pub(crate) parent: Option<ParentRef>,
    pub(crate) children: Vec<ProcessId>,
}

impl Process {
    pub fn new(identity: ProcessIdentity) -> Self {
        Self {
            identity,
            regions: Vec::new(),
            parent: None,
            children: Vec::new(),
        }
    }

    pub fn pid(&self) -> i32 {
        self.identity.pid
    }

    pub fn name(&self) -> &str {
        &self.identity.name
    }

    /// Parent link, `None` until the hierarchy is built
    pub fn parent(&self) -> Option<ParentRef> {
        self.parent
    }

    pub fn children(&self) -> &[ProcessId] {
        &self.children
    }

    /// Sum of the counters of every region
    pub fn total_stats(&self) -> RegionStats {
        let mut total = RegionStats::default();
        for region in &self.regions {
            total.sum_merge(&region.stats);
        }
        total
    }
}
