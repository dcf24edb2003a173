use pretty_assertions::assert_eq;
use smaps_filter::parser::{parse_capture_str, Diagnostic, Diagnostics};
use smaps_filter::snapshot::{
    build_hierarchy, collapse_threads, is_same_task, prune_kernel_threads, ParentRef, Snapshot,
};
use std::collections::HashSet;

/// One status block; `vm` goes into VmPeak and VmRSS
fn block(pid: i32, name: &str, ppid: i32, threads: i32, vm: u64) -> String {
    format!(
        "==> /proc/{pid}/smaps <==\n#Name: {name}\n#Pid: {pid}\n#PPid: {ppid}\n#Threads: {threads}\n\
#VmPeak: {vm}\n#VmRSS: {vm}\n\
{:08x}-{:08x} r-xp 00000000 08:01 1 /bin/{name}\nRss: 4 kB\n\n",
        pid as u64 * 0x1000,
        pid as u64 * 0x1000 + 0x1000,
    )
}

fn cleaned(text: &str) -> (Snapshot, Diagnostics) {
    let mut diag = Diagnostics::new();
    let mut snap = parse_capture_str("t", text, &mut diag);
    build_hierarchy(&mut snap, &mut diag).unwrap();
    collapse_threads(&mut snap, &mut diag).unwrap();
    (snap, diag)
}

/// Walks parents up to the root; fails on a cycle
fn assert_forest(snap: &Snapshot) {
    for process in snap.processes() {
        let mut seen = HashSet::new();
        let mut node = process.parent();
        loop {
            match node {
                Some(ParentRef::Root) => break,
                Some(ParentRef::Process(id)) => {
                    assert!(seen.insert(id), "cycle above pid {}", process.pid());
                    node = snap.get(id).unwrap().parent();
                }
                None => panic!("pid {} is unattached", process.pid()),
            }
        }
    }
}

#[test]
fn test_hierarchy_is_forest() {
    let text = [
        block(1, "init", 0, 1, 10),
        block(20, "daemon", 1, 1, 20),
        block(21, "worker", 20, 1, 30),
        block(30, "orphan", 999, 1, 40),
        block(40, "loopa", 41, 1, 50),
        block(41, "loopb", 40, 1, 60),
        block(50, "selfish", 50, 1, 70),
    ]
    .concat();
    let (snap, diag) = cleaned(&text);

    assert_eq!(snap.len(), 7);
    assert_forest(&snap);

    let init = snap.find_by_pid(1).unwrap();
    let daemon = snap.find_by_pid(20).unwrap();
    assert_eq!(snap.children_of(ParentRef::Process(init)), &[daemon]);
    assert_eq!(
        diag.count(|d| matches!(d, Diagnostic::ParentNotFound { pid: 30, ppid: 999 })),
        1
    );
    assert_eq!(diag.count(|d| matches!(d, Diagnostic::ParentCycle { .. })), 1);
    assert_eq!(
        diag.count(|d| matches!(d, Diagnostic::ParentNotFound { pid: 50, .. })),
        1
    );
}

#[test]
fn test_collapse_thread_into_parent() {
    // X(5) with thread Y(6); Y's child Z(7) moves to X
    let text = [
        block(5, "X", 0, 2, 100),
        block(6, "X", 5, 3, 100),
        block(7, "Z", 6, 1, 7),
    ]
    .concat();
    let (snap, diag) = cleaned(&text);

    assert_eq!(snap.len(), 2);
    assert!(snap.find_by_pid(6).is_none());

    let x_id = snap.find_by_pid(5).unwrap();
    let z_id = snap.find_by_pid(7).unwrap();
    let x = snap.get(x_id).unwrap();
    let z = snap.get(z_id).unwrap();
    assert_eq!(x.identity.threads, 5);
    assert_eq!(x.children(), &[z_id]);
    assert_eq!(z.identity.ppid, 5);
    assert_eq!(z.parent(), Some(ParentRef::Process(x_id)));
    assert_eq!(
        diag.count(|d| matches!(d, Diagnostic::ThreadCollapsed { parent: 5, child: 6 })),
        1
    );
    assert_forest(&snap);
}

#[test]
fn test_no_same_task_pairs_after_collapse() {
    let text = [
        block(1, "init", 0, 1, 10),
        block(2, "srv", 1, 1, 50),
        block(3, "srv", 2, 1, 50),
        block(4, "srv", 3, 1, 50),
        block(5, "srv", 4, 1, 51),
        block(6, "srv", 5, 1, 51),
    ]
    .concat();
    let (snap, _) = cleaned(&text);

    for process in snap.processes() {
        if let Some(ParentRef::Process(parent)) = process.parent() {
            let parent = snap.get(parent).unwrap();
            assert!(!is_same_task(&parent.identity, &process.identity));
        }
    }
    let srv = snap.get(snap.find_by_pid(2).unwrap()).unwrap();
    assert_eq!(srv.identity.threads, 3);
    let forked = snap.get(snap.find_by_pid(5).unwrap()).unwrap();
    assert_eq!(forked.identity.threads, 2);
    assert_eq!(snap.len(), 3);
}

#[test]
fn test_legacy_capture_is_not_collapsed() {
    let text = "\
==> /proc/5/smaps <==
==> /proc/6/smaps <==
";
    let (snap, diag) = cleaned(text);
    assert_eq!(snap.len(), 2);
    assert_eq!(diag.count(|d| matches!(d, Diagnostic::LegacyFormat { .. })), 1);
}

#[test]
fn test_prune_kernel_threads() {
    let text = [
        block(1, "init", 0, 1, 10),
        block(2, "kthreadd", 0, 1, 0),
        block(3, "ksoftirqd", 2, 1, 1),
        block(4, "kworker", 2, 1, 2),
        block(9, "shell", 1, 1, 3),
    ]
    .concat();
    let (mut snap, _) = cleaned(&text);

    assert_eq!(prune_kernel_threads(&mut snap).unwrap(), 3);
    assert_eq!(snap.len(), 2);
    assert_eq!(snap.root_children().len(), 1);
    assert!(snap.find_by_pid(4).is_none());
    assert_forest(&snap);
}
