//! In-memory model of one capture.
//!
//! A [`Snapshot`] owns every [`Process`] in an arena of slots. Tree links
//! between processes are [`ProcessId`] indices into that arena, so removing
//! a process vacates its slot without invalidating any other id.

pub mod hierarchy;
mod mapping;
mod process;
mod stats;

pub use hierarchy::{build_hierarchy, collapse_threads, is_same_task, prune_kernel_threads};
pub use mapping::{basename, Mapping};
pub use process::{
    ParentRef, Process, ProcessId, ProcessIdentity, RegionRecord, VmCounters, VM_KEYS,
};
pub use stats::{RegionStats, STAT_KEYS};

use crate::utils::error::ModelError;
use serde::Serialize;

/// Capture flavour
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CaptureFormat {
    /// No per-process status lines
    Legacy,
    /// At least one `#Key:` status line was seen
    Modern,
}

/// One capture: every process with its regions
#[derive(Debug, Clone)]
pub struct Snapshot {
    source: String,
    format: CaptureFormat,
    slots: Vec<Option<Process>>,
    order: Vec<ProcessId>,
    root_children: Vec<ProcessId>,
    next_region_uid: usize,
}

impl Snapshot {
    /// Empty legacy snapshot labelled with its source
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            format: CaptureFormat::Legacy,
            slots: Vec::new(),
            order: Vec::new(),
            root_children: Vec::new(),
            next_region_uid: 0,
        }
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn format(&self) -> CaptureFormat {
        self.format
    }

    pub fn mark_modern(&mut self) {
        self.format = CaptureFormat::Modern;
    }

    /// Number of live processes
    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Add a process to the arena and to the end of the flat list
    pub fn add_process(&mut self, identity: ProcessIdentity) -> ProcessId {
        let id = ProcessId(self.slots.len());
        self.slots.push(Some(Process::new(identity)));
        self.order.push(id);
        id
    }

    /// Append a region to a process, giving it the next creation-order id
    pub fn add_region(&mut self, id: ProcessId, mapping: Mapping) -> Result<usize, ModelError> {
        let uid = self.next_region_uid;
        self.get_mut(id)?.regions.push(RegionRecord::new(uid, mapping));
        self.next_region_uid += 1;
        Ok(uid)
    }

    pub fn process(&self, id: ProcessId) -> Option<&Process> {
        self.slots.get(id.0).and_then(Option::as_ref)
    }

    pub fn process_mut(&mut self, id: ProcessId) -> Option<&mut Process> {
        self.slots.get_mut(id.0).and_then(Option::as_mut)
    }

    /// Live process or `ModelError::VacantSlot`
    pub fn get(&self, id: ProcessId) -> Result<&Process, ModelError> {
        self.process(id).ok_or(ModelError::VacantSlot(id.0))
    }

    pub fn get_mut(&mut self, id: ProcessId) -> Result<&mut Process, ModelError> {
        self.process_mut(id).ok_or(ModelError::VacantSlot(id.0))
    }

    /// Ids of the flat list, in its current order
    pub fn process_ids(&self) -> &[ProcessId] {
        &self.order
    }

    /// Live processes in flat-list order
    pub fn processes(&self) -> impl Iterator<Item = &Process> {
        self.order.iter().filter_map(|id| self.process(*id))
    }

    /// Live processes in arena order, for passes where order is irrelevant
    pub fn processes_mut(&mut self) -> impl Iterator<Item = &mut Process> {
        self.slots.iter_mut().flatten()
    }

    pub fn find_by_pid(&self, pid: i32) -> Option<ProcessId> {
        self.order
            .iter()
            .copied()
            .find(|id| self.process(*id).map(Process::pid) == Some(pid))
    }

    /// Children of the synthetic root
    pub fn root_children(&self) -> &[ProcessId] {
        &self.root_children
    }

    /// Children of any tree node
    pub fn children_of(&self, node: ParentRef) -> &[ProcessId] {
        match node {
            ParentRef::Root => &self.root_children,
            ParentRef::Process(id) => self.process(id).map(Process::children).unwrap_or(&[]),
        }
    }

    pub(crate) fn children_of_mut(
        &mut self,
        node: ParentRef,
    ) -> Result<&mut Vec<ProcessId>, ModelError> {
        match node {
            ParentRef::Root => Ok(&mut self.root_children),
            ParentRef::Process(id) => Ok(&mut self.get_mut(id)?.children),
        }
    }

    /// Order the flat list by pid
    pub fn sort_by_pid(&mut self) {
        let slots = &self.slots;
        self.order
            .sort_by_key(|id| slots[id.0].as_ref().map(Process::pid).unwrap_or(i32::MAX));
    }

    /// Vacate a slot and drop the process from the flat list
    ///
    /// Tree links pointing at the process are left to the caller.
    pub(crate) fn remove_process(&mut self, id: ProcessId) -> Option<Process> {
        self.order.retain(|other| *other != id);
        self.slots.get_mut(id.0).and_then(Option::take)
    }

    /// Total number of regions over all live processes
    pub fn region_count(&self) -> usize {
        self.processes().map(|p| p.regions.len()).sum()
    }
}
