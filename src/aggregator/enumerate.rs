//! Enumeration phase: dense ids for applications, classes, libraries and
//! groups.
//!
//! Ids are assigned in a fixed order so that every region of one library
//! sits in one contiguous run of the path-sorted working sequence.

use crate::snapshot::{basename, ProcessId, Snapshot};
use crate::utils::config::CLASS_SEEDS;
use crate::utils::error::ModelError;
use crate::utils::symtab::SymbolTable;
use log::debug;
use serde::Serialize;
use std::cmp::Ordering;

/// Address of one region inside a snapshot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegionRef {
    pub process: ProcessId,
    /// Index into the process's region list
    pub region: usize,
}

/// Process details kept per application instance
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ApplicationInstance {
    pub name: String,
    pub pid: i32,
    pub ppid: i32,
    pub threads: i32,
}

/// Result of one enumeration pass
///
/// **Public** - input to the accumulate phase and to report writers
#[derive(Debug, Clone)]
pub struct Enumeration {
    /// Class names by ClassId; index 0 is the synthetic `total`
    pub classes: Vec<String>,
    /// `name(pid)` keys by ApplicationId
    pub applications: Vec<String>,
    /// Backing paths by LibraryId
    pub libraries: Vec<String>,
    /// Process details by ApplicationId
    pub instances: Vec<ApplicationInstance>,
    /// ApplicationId of every GroupId
    pub group_application: Vec<usize>,
    /// LibraryId of every GroupId
    pub group_library: Vec<usize>,
    working: Vec<RegionRef>,
    working_libraries: Vec<usize>,
}

impl Enumeration {
    pub fn group_count(&self) -> usize {
        self.group_application.len()
    }

    /// Every region, in path order
    pub fn working(&self) -> &[RegionRef] {
        &self.working
    }

    /// Contiguous run of regions backed by one library
    pub fn library_regions(&self, library: usize) -> &[RegionRef] {
        let start = self.working_libraries.partition_point(|l| *l < library);
        let end = self.working_libraries.partition_point(|l| *l <= library);
        &self.working[start..end]
    }
}

/// Case-insensitive comparison, ASCII folding
fn cmp_ignore_case(a: &str, b: &str) -> Ordering {
    a.bytes()
        .map(|c| c.to_ascii_lowercase())
        .cmp(b.bytes().map(|c| c.to_ascii_lowercase()))
}

/// Sort rank of a path: special `[...]` names, then cache files, then the rest
fn path_rank(path: &str) -> u8 {
    if path.starts_with('[') {
        0
    } else if path.contains(".cache") {
        1
    } else {
        2
    }
}

/// Ordering of backing paths in the working sequence
///
/// Special names first, cache-backed files next, then by base name and
/// full path ignoring case. The final case-sensitive step makes the order
/// total, so equal paths are always adjacent.
pub fn compare_paths(a: &str, b: &str) -> Ordering {
    path_rank(a)
        .cmp(&path_rank(b))
        .then_with(|| cmp_ignore_case(basename(a), basename(b)))
        .then_with(|| cmp_ignore_case(a, b))
        .then_with(|| a.cmp(b))
}

/// Assign application, class, library and group ids to every region
///
/// **Public** - first phase of the aggregation engine
///
/// Ids left over from an earlier pass are cleared first; ids are only
/// consistent within one pass.
///
/// # Errors
/// * `ModelError::GroupConflict` - a group key resolved to two pairs
/// * `ModelError::VacantSlot` - the flat list references a removed process
pub fn enumerate(snapshot: &mut Snapshot) -> Result<Enumeration, ModelError> {
    let mut classes = SymbolTable::seeded(CLASS_SEEDS);
    let mut applications = SymbolTable::new();
    let mut libraries = SymbolTable::new();
    let mut groups = SymbolTable::new();

    for process in snapshot.processes_mut() {
        for region in &mut process.regions {
            region.clear_ids();
        }
    }

    // Step 1: processes by name, then pid
    let mut keyed: Vec<(ProcessId, String, i32)> = Vec::with_capacity(snapshot.len());
    for id in snapshot.process_ids() {
        let process = snapshot.get(*id)?;
        keyed.push((*id, process.name().to_string(), process.pid()));
    }
    keyed.sort_by(|(_, na, pa), (_, nb, pb)| {
        cmp_ignore_case(na, nb)
            .then_with(|| na.cmp(nb))
            .then(pa.cmp(pb))
    });

    // Step 2: application and class ids
    let mut instances = Vec::new();
    let mut working = Vec::new();
    for (id, name, pid) in &keyed {
        let application = applications.enumerate(&format!("{}({})", name, pid));
        let process = snapshot.get_mut(*id)?;
        if application == instances.len() {
            instances.push(ApplicationInstance {
                name: name.clone(),
                pid: *pid,
                ppid: process.identity.ppid,
                threads: process.identity.threads,
            });
        }
        for (index, region) in process.regions.iter_mut().enumerate() {
            let class = classes.enumerate(region.mapping.class());
            region.assign_application(application, class);
            working.push(RegionRef {
                process: *id,
                region: index,
            });
        }
    }

    // Step 3: working sequence by path
    let mut by_path: Vec<(&str, RegionRef)> = Vec::with_capacity(working.len());
    for r in &working {
        let region = region_at(snapshot, *r)?;
        by_path.push((region.mapping.path.as_str(), *r));
    }
    by_path.sort_by(|a, b| compare_paths(a.0, b.0));
    let working: Vec<RegionRef> = by_path.into_iter().map(|(_, r)| r).collect();

    // Step 4: library and group ids in path order
    let mut group_application = Vec::new();
    let mut group_library = Vec::new();
    let mut working_libraries = Vec::with_capacity(working.len());
    for r in &working {
        let region = snapshot
            .get_mut(r.process)?
            .regions
            .get_mut(r.region)
            .ok_or(ModelError::VacantSlot(r.process.index()))?;

        let application = region.application_id()?;
        let library = libraries.enumerate(&region.mapping.path);
        let group = groups.enumerate(&format!("app{}::lib{}", application, library));

        if group == group_application.len() {
            group_application.push(application);
            group_library.push(library);
        } else if group_application[group] != application || group_library[group] != library {
            return Err(ModelError::GroupConflict {
                group,
                app_a: group_application[group],
                lib_a: group_library[group],
                app_b: application,
                lib_b: library,
            });
        }

        region.assign_library(library, group);
        working_libraries.push(library);
    }

    debug!(
        "Enumerated {}: {} applications, {} classes, {} libraries, {} groups",
        snapshot.source(),
        applications.len(),
        classes.len(),
        libraries.len(),
        groups.len()
    );

    Ok(Enumeration {
        classes: classes.names(),
        applications: applications.names(),
        libraries: libraries.names(),
        instances,
        group_application,
        group_library,
        working,
        working_libraries,
    })
}

/// Region addressed by a [`RegionRef`]
pub fn region_at(
    snapshot: &Snapshot,
    r: RegionRef,
) -> Result<&crate::snapshot::RegionRecord, ModelError> {
    snapshot
        .get(r.process)?
        .regions
        .get(r.region)
        .ok_or(ModelError::VacantSlot(r.process.index()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compare_paths_special_first() {
        assert_eq!(compare_paths("[heap]", "/lib/a.so"), Ordering::Less);
        assert_eq!(compare_paths("/home/u/.cache/x", "/lib/a.so"), Ordering::Less);
        assert_eq!(compare_paths("[stack]", "/home/u/.cache/x"), Ordering::Less);
    }

    #[test]
    fn test_compare_paths_by_basename_ignoring_case() {
        assert_eq!(compare_paths("/usr/lib/B.so", "/lib/a.so"), Ordering::Greater);
        assert_eq!(compare_paths("/z/a.so", "/lib/A.so"), Ordering::Greater);
        assert_eq!(compare_paths("/lib/a.so", "/lib/a.so"), Ordering::Equal);
        assert_ne!(compare_paths("/lib/A.so", "/lib/a.so"), Ordering::Equal);
    }
}
