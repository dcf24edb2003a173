//! Process tree reconstruction and thread removal.
//!
//! Captures list processes flat. The tree is rebuilt from PPid values, then
//! per-thread entries that older capture tools recorded as processes are
//! folded back into their owner.

use super::{CaptureFormat, ParentRef, ProcessId, ProcessIdentity, Snapshot};
use crate::parser::Diagnostics;
use crate::utils::config::KTHREADD_NAME;
use crate::utils::error::ModelError;
use log::{debug, info};

/// Link every process of the flat list into the forest
///
/// **Public** - first cleaning step after parsing
///
/// Each process is attached to the process whose pid equals its PPid, or to
/// the synthetic root when no such process exists, when the PPid is its own
/// pid, or when following parents would lead back to itself.
///
/// # Errors
/// * `ModelError::ParentAlreadyAssigned` - the snapshot was already linked
pub fn build_hierarchy(snapshot: &mut Snapshot, diag: &mut Diagnostics) -> Result<(), ModelError> {
    snapshot.sort_by_pid();

    let sorted: Vec<(i32, ProcessId)> = snapshot
        .process_ids()
        .iter()
        .map(|id| Ok((snapshot.get(*id)?.pid(), *id)))
        .collect::<Result<_, ModelError>>()?;

    // Step 1: resolve each PPid by binary search over the pid-sorted list
    let mut parents: Vec<Option<usize>> = Vec::with_capacity(sorted.len());
    for (index, &(pid, id)) in sorted.iter().enumerate() {
        let ppid = snapshot.get(id)?.identity.ppid;
        match sorted.binary_search_by_key(&ppid, |(p, _)| *p) {
            Ok(found) if found != index => parents.push(Some(found)),
            _ => {
                if ppid != 0 {
                    diag.parent_not_found(pid, ppid);
                }
                parents.push(None);
            }
        }
    }

    // Step 2: break PPid loops so every chain ends at the root
    for index in 0..sorted.len() {
        if leads_back(&parents, index) {
            let (pid, id) = sorted[index];
            diag.parent_cycle(pid, snapshot.get(id)?.identity.ppid);
            parents[index] = None;
        }
    }

    // Step 3: attach
    for (&(_, id), parent) in sorted.iter().zip(parents) {
        let parent = match parent {
            Some(found) => ParentRef::Process(sorted[found].1),
            None => ParentRef::Root,
        };
        attach(snapshot, id, parent)?;
    }

    debug!(
        "Built hierarchy for {}: {} processes, {} top-level",
        snapshot.source(),
        snapshot.len(),
        snapshot.root_children().len()
    );
    Ok(())
}

/// Whether the parent chain starting at `start` returns to it
///
/// **Private** - cycle check for build_hierarchy
fn leads_back(parents: &[Option<usize>], start: usize) -> bool {
    let mut current = parents[start];
    for _ in 0..parents.len() {
        match current {
            None => return false,
            Some(index) if index == start => return true,
            Some(index) => current = parents[index],
        }
    }
    false
}

fn attach(snapshot: &mut Snapshot, id: ProcessId, parent: ParentRef) -> Result<(), ModelError> {
    let process = snapshot.get_mut(id)?;
    if process.parent.is_some() {
        return Err(ModelError::ParentAlreadyAssigned { pid: process.pid() });
    }
    process.parent = Some(parent);
    snapshot.children_of_mut(parent)?.push(id);
    Ok(())
}

/// Heuristic thread test
///
/// A child whose name and all ten VM counters equal its parent's shares
/// the parent's address space and is taken to be one of its threads.
pub fn is_same_task(parent: &ProcessIdentity, child: &ProcessIdentity) -> bool {
    parent.name == child.name && parent.vm == child.vm
}

/// Fold thread entries into their owning process
///
/// **Public** - second cleaning step, after build_hierarchy
///
/// Depth first, every child that passes [`is_same_task`] against its parent
/// hands its own children to the parent (their PPid is rewritten), adds its
/// thread count to the parent and leaves the snapshot. Its regions are
/// dropped with it.
///
/// Legacy captures carry no VM counters and are left untouched. Processes
/// that are not linked into the tree when the pass ends are removed as well.
///
/// # Returns
/// Number of processes removed
pub fn collapse_threads(snapshot: &mut Snapshot, diag: &mut Diagnostics) -> Result<usize, ModelError> {
    if snapshot.format() == CaptureFormat::Legacy {
        diag.legacy_format(snapshot.source());
        return Ok(0);
    }

    let mut removed = Vec::new();
    collapse_node(snapshot, ParentRef::Root, diag, &mut removed)?;

    // Anything still unattached after the pass leaves the flat list too
    let stray: Vec<ProcessId> = snapshot
        .process_ids()
        .iter()
        .copied()
        .filter(|id| !removed.contains(id))
        .filter(|id| snapshot.process(*id).is_some_and(|p| p.parent.is_none()))
        .collect();
    if !stray.is_empty() {
        debug!("Dropping {} unattached processes from {}", stray.len(), snapshot.source());
    }
    removed.extend(stray);

    for id in &removed {
        snapshot.remove_process(*id);
    }

    if !removed.is_empty() {
        info!(
            "Collapsed {} thread entries in {}",
            removed.len(),
            snapshot.source()
        );
    }
    Ok(removed.len())
}

/// **Private** - recursive worker for collapse_threads
fn collapse_node(
    snapshot: &mut Snapshot,
    node: ParentRef,
    diag: &mut Diagnostics,
    removed: &mut Vec<ProcessId>,
) -> Result<(), ModelError> {
    let children = snapshot.children_of(node).to_vec();
    for child in children {
        collapse_node(snapshot, ParentRef::Process(child), diag, removed)?;
    }

    // The synthetic root is never a thread owner
    let ParentRef::Process(parent_id) = node else {
        return Ok(());
    };

    // The child list may grow while adopted grandchildren are appended
    let mut i = 0;
    while i < snapshot.get(parent_id)?.children.len() {
        let child_id = snapshot.get(parent_id)?.children[i];
        i += 1;

        let parent = snapshot.get(parent_id)?;
        if !is_same_task(&parent.identity, &snapshot.get(child_id)?.identity) {
            continue;
        }
        let parent_pid = parent.pid();

        let child = snapshot.get_mut(child_id)?;
        let grandchildren = std::mem::take(&mut child.children);
        let threads = child.identity.threads;
        let child_pid = child.pid();
        child.parent = None;

        for grandchild in &grandchildren {
            let grandchild = snapshot.get_mut(*grandchild)?;
            grandchild.identity.ppid = parent_pid;
            grandchild.parent = Some(ParentRef::Process(parent_id));
        }

        let parent = snapshot.get_mut(parent_id)?;
        parent.children.extend(grandchildren);
        parent.identity.threads = parent.identity.threads.saturating_add(threads);
        diag.thread_collapsed(parent_pid, child_pid, &parent.identity.name);
        removed.push(child_id);
    }

    // Compact: drop the detached entries
    let kept: Vec<ProcessId> = snapshot
        .get(parent_id)?
        .children
        .iter()
        .copied()
        .filter(|c| snapshot.process(*c).is_some_and(|p| p.parent.is_some()))
        .collect();
    snapshot.get_mut(parent_id)?.children = kept;
    Ok(())
}

/// Remove `kthreadd` and everything below it
///
/// Kernel threads have no user-space mappings, so they only add empty rows
/// to an analysis. Only a `kthreadd` directly under the root is considered.
///
/// # Returns
/// Number of processes removed
pub fn prune_kernel_threads(snapshot: &mut Snapshot) -> Result<usize, ModelError> {
    let Some(kthreadd) = snapshot
        .root_children()
        .iter()
        .copied()
        .find(|id| snapshot.process(*id).is_some_and(|p| p.name() == KTHREADD_NAME))
    else {
        return Ok(0);
    };

    let mut doomed = vec![kthreadd];
    let mut i = 0;
    while i < doomed.len() {
        let below = snapshot.children_of(ParentRef::Process(doomed[i])).to_vec();
        doomed.extend(below);
        i += 1;
    }

    snapshot
        .children_of_mut(ParentRef::Root)?
        .retain(|id| *id != kthreadd);
    for id in &doomed {
        snapshot.remove_process(*id);
    }

    debug!("Pruned {} kernel threads from {}", doomed.len(), snapshot.source());
    Ok(doomed.len())
}
