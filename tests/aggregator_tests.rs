use pretty_assertions::assert_eq;
use smaps_filter::aggregator::{
    analyze, application_values, enumerate, region_at, Analysis,
};
use smaps_filter::parser::{parse_capture_str, Diagnostics};
use smaps_filter::snapshot::{build_hierarchy, RegionStats, Snapshot};

/// Two instances of `app`, one `tool`, all sharing libc
const CAPTURE: &str = "\
==> /proc/300/smaps <==
#Name: tool
#PPid: 0
00400000-00410000 r-xp 00000000 08:01 7 /usr/bin/tool
Size: 64 kB
Rss: 40 kB
Shared_Clean: 40 kB
Pss: 20 kB
7f000000-7f100000 r-xp 00000000 08:01 9 /lib/libc.so
Size: 1024 kB
Rss: 600 kB
Shared_Clean: 600 kB
Pss: 200 kB
01000000-01010000 rw-p 00000000 00:00 0 [heap]
Size: 64 kB
Rss: 64 kB
Private_Dirty: 64 kB
Pss: 64 kB

==> /proc/100/smaps <==
#Name: app
#PPid: 0
00400000-00420000 r-xp 00000000 08:01 8 /usr/bin/app
Size: 128 kB
Rss: 100 kB
Shared_Clean: 100 kB
Pss: 50 kB
7f000000-7f100000 r-xp 00000000 08:01 9 /lib/libc.so
Size: 1024 kB
Rss: 600 kB
Shared_Clean: 600 kB
Pss: 200 kB
7f200000-7f201000 rw-p 00100000 08:01 9 /lib/libc.so
Size: 4 kB
Rss: 4 kB
Private_Dirty: 4 kB
Pss: 4 kB
7ffd0000-7fff0000 rw-p 00000000 00:00 0 [stack]
Size: 128 kB
Rss: 12 kB
Private_Dirty: 12 kB
Pss: 12 kB

==> /proc/101/smaps <==
#Name: app
#PPid: 100
00400000-00420000 r-xp 00000000 08:01 8 /usr/bin/app
Size: 128 kB
Rss: 100 kB
Shared_Clean: 100 kB
Pss: 50 kB
7f000000-7f100000 r-xp 00000000 08:01 9 /lib/libc.so
Size: 1024 kB
Rss: 600 kB
Shared_Clean: 600 kB
Pss: 200 kB
00600000-00700000 rw-p 00000000 00:00 0
Size: 1024 kB
Rss: 900 kB
Private_Dirty: 900 kB
Pss: 900 kB
";

fn snapshot() -> Snapshot {
    let mut diag = Diagnostics::new();
    let mut snap = parse_capture_str("agg", CAPTURE, &mut diag);
    build_hierarchy(&mut snap, &mut diag).unwrap();
    snap
}

fn analysis() -> (Snapshot, Analysis) {
    let mut snap = snapshot();
    let analysis = analyze(&mut snap).unwrap();
    (snap, analysis)
}

fn class(analysis: &Analysis, name: &str) -> usize {
    analysis
        .enumeration
        .classes
        .iter()
        .position(|c| c == name)
        .unwrap()
}

fn sum(stats: &[RegionStats]) -> RegionStats {
    let mut total = RegionStats::default();
    for s in stats {
        total.sum_merge(s);
    }
    total
}

#[test]
fn test_enumerate_instances_by_name_then_pid() {
    let mut snap = snapshot();
    let enumeration = enumerate(&mut snap).unwrap();

    assert_eq!(
        enumeration.applications,
        vec!["app(100)", "app(101)", "tool(300)"]
    );
    assert_eq!(enumeration.instances[1].ppid, 100);
    assert_eq!(
        &enumeration.classes[..6],
        &["total", "code", "data", "heap", "anon", "stack"]
    );
    assert_eq!(enumeration.classes.len(), 6);
}

#[test]
fn test_enumerate_is_repeatable() {
    let mut snap = snapshot();
    let first = enumerate(&mut snap).unwrap();
    let second = enumerate(&mut snap).unwrap();

    assert_eq!(first.applications, second.applications);
    assert_eq!(first.libraries, second.libraries);
    assert_eq!(first.group_application, second.group_application);
    assert_eq!(first.working(), second.working());
}

#[test]
fn test_special_paths_sort_first() {
    let mut snap = snapshot();
    let enumeration = enumerate(&mut snap).unwrap();

    assert_eq!(
        enumeration.libraries,
        vec!["[anon]", "[heap]", "[stack]", "/usr/bin/app", "/lib/libc.so", "/usr/bin/tool"]
    );
}

#[test]
fn test_library_regions_are_contiguous() {
    let mut snap = snapshot();
    let enumeration = enumerate(&mut snap).unwrap();

    let libc = enumeration
        .libraries
        .iter()
        .position(|l| l == "/lib/libc.so")
        .unwrap();
    let regions = enumeration.library_regions(libc);
    assert_eq!(regions.len(), 4);
    for r in regions {
        let region = region_at(&snap, *r).unwrap();
        assert_eq!(region.mapping.path, "/lib/libc.so");
        assert_eq!(region.library_id().unwrap(), libc);
    }
}

#[test]
fn test_group_maps_to_one_pair() {
    let mut snap = snapshot();
    let enumeration = enumerate(&mut snap).unwrap();

    for r in enumeration.working() {
        let region = region_at(&snap, *r).unwrap();
        let group = region.group_id().unwrap();
        assert_eq!(
            enumeration.group_application[group],
            region.application_id().unwrap()
        );
        assert_eq!(enumeration.group_library[group], region.library_id().unwrap());
    }
    // app(100) maps libc twice but it is one group
    assert_eq!(enumeration.group_count(), 9);
}

#[test]
fn test_app_total_is_sum_of_classes() {
    let (_, analysis) = analysis();
    for app in 0..analysis.app_mem.rows() {
        let row = analysis.app_mem.row(app);
        assert_eq!(row[0], sum(&row[1..]));
    }
    for lib in 0..analysis.lib_mem.rows() {
        let row = analysis.lib_mem.row(lib);
        assert_eq!(row[0], sum(&row[1..]));
    }
}

#[test]
fn test_estimate_bounded_by_totals() {
    let (_, analysis) = analysis();
    for class in 0..analysis.class_count() {
        assert!(analysis.system_estimate[class].pss <= analysis.system_totals[class].pss);
        assert!(analysis.system_estimate[class].rss <= analysis.system_totals[class].rss);
    }
}

#[test]
fn test_shared_library_counted_once_in_estimate() {
    let (_, analysis) = analysis();
    let code = class(&analysis, "code");

    // three mappings of libc code: 600 kB shared each
    let libc = analysis
        .enumeration
        .libraries
        .iter()
        .position(|l| l == "/lib/libc.so")
        .unwrap();
    let libc_code = analysis.lib_mem.cell(libc, code);
    assert_eq!(libc_code.shared_clean, 600);
    assert_eq!(libc_code.rss, 600);
    assert_eq!(libc_code.pss, 600);

    assert_eq!(analysis.system_totals[code].shared_clean, 40 + 600 + 100 + 600 + 100 + 600);
    assert_eq!(analysis.system_estimate[code].shared_clean, 40 + 600 + 100);
}

#[test]
fn test_app_max_tracks_worst_application() {
    let (_, analysis) = analysis();
    let anon = class(&analysis, "anon");
    let data = class(&analysis, "data");

    assert_eq!(analysis.app_max[anon].private_dirty, 900);
    assert_eq!(analysis.app_max[data].private_dirty, 4);
    assert_eq!(analysis.system_totals[0], sum(&analysis.system_totals[1..]));
    assert_eq!(analysis.app_max[0], sum(&analysis.app_max[1..]));
}

#[test]
fn test_application_values_heaviest_first() {
    let (_, analysis) = analysis();
    let rows = application_values(&analysis);

    let pids: Vec<i32> = rows.iter().map(|r| r.instance.pid).collect();
    assert_eq!(pids, vec![101, 300, 100]);
    assert_eq!(rows[0].total.pss, 50 + 200 + 900);

    let anon = class(&analysis, "anon") - 1;
    assert_eq!(rows[0].per_class[anon], 900);
    assert_eq!(rows[0].per_class.len(), analysis.class_count() - 1);
}
