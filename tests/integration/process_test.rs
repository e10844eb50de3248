use std::thread;

use rigtune::core::process::validate_cores;
use rigtune::core::{ProcessFilter, SortKey, SortOrder};
use rigtune::platform::{OsKind, PriorityClass, ProcessStatus};
use rigtune::ErrorKind;

use super::support::{child_of, cores, process, FakePlatform};

fn chrome_host() -> FakePlatform {
    FakePlatform::new(OsKind::Linux, 8)
        .with_process(process(100, "chrome", 2.0))
        .with_process(process(101, "Chrome Helper", 7.5))
        .with_process(process(102, "chrome", 12.0))
        .with_process(process(200, "code", 30.0))
        .with_process(process(300, "systemd", 0.1))
}

#[test]
fn test_chrome_scenario() {
    let (_, engine) = chrome_host().into_engine();
    let filter = ProcessFilter {
        search_query: Some("chrome".to_string()),
        min_cpu: Some(5.0),
        sort_by: Some(SortKey::Cpu),
        sort_order: Some(SortOrder::Desc),
        page: 0,
        per_page: Some(10),
        ..Default::default()
    };

    let page = engine.list_processes(&filter).unwrap();
    let pids: Vec<u32> = page.processes.iter().map(|p| p.pid).collect();
    assert_eq!(pids, vec![102, 101]);
    assert_eq!(page.total_count, 2);
}

#[test]
fn test_total_count_is_pre_pagination() {
    let (_, engine) = chrome_host().into_engine();
    let filter = ProcessFilter::default().paged(0, 2);

    let page = engine.list_processes(&filter).unwrap();
    assert_eq!(page.processes.len(), 2);
    assert_eq!(page.total_count, 5);
}

#[test]
fn test_page_beyond_range_is_empty() {
    let (_, engine) = chrome_host().into_engine();
    let filter = ProcessFilter::default().search("chrome").paged(7, 10);

    let page = engine.list_processes(&filter).unwrap();
    assert!(page.processes.is_empty());
    assert_eq!(page.total_count, 3);
}

#[test]
fn test_ties_break_by_ascending_pid() {
    let (_, engine) = FakePlatform::new(OsKind::Linux, 4)
        .with_process(process(9, "a", 0.0))
        .with_process(process(3, "a", 0.0))
        .with_process(process(5, "a", 0.0))
        .into_engine();

    for key in [SortKey::Name, SortKey::Cpu, SortKey::Memory] {
        for order in [SortOrder::Asc, SortOrder::Desc] {
            let filter = ProcessFilter::default().sorted(key, order);
            let pids: Vec<u32> = engine
                .list_processes(&filter)
                .unwrap()
                .processes
                .iter()
                .map(|p| p.pid)
                .collect();
            assert_eq!(pids, vec![3, 5, 9], "sort by {} {}", key, order);
        }
    }
}

#[test]
fn test_status_filter() {
    let (fake, engine) = chrome_host().into_engine();
    assert!(engine.suspend_process(200).success);

    let filter = ProcessFilter {
        status: Some(ProcessStatus::Suspended),
        ..Default::default()
    };
    let page = engine.list_processes(&filter).unwrap();
    assert_eq!(page.total_count, 1);
    assert!(page.processes[0].is_suspended);
    assert_eq!(fake.status_of(200), Some(ProcessStatus::Suspended));
}

#[test]
fn test_affinity_scenario() {
    let (fake, engine) = FakePlatform::new(OsKind::Linux, 8)
        .with_process(process(42, "game", 50.0))
        .into_engine();

    assert!(engine.set_process_affinity(42, &cores(&[0, 2])).success);
    let info = engine.get_process_affinity(42).unwrap();
    assert_eq!(info.current_mask, cores(&[0, 2]));
    assert_eq!(info.core_count, 8);

    let response = engine.set_process_affinity(42, &cores(&[0, 2, 9]));
    assert!(!response.success);
    assert_eq!(response.error, Some(ErrorKind::InvalidArgument));
    assert_eq!(fake.affinity_of(42), cores(&[0, 2]));
}

#[test]
fn test_empty_affinity_never_reaches_the_os() {
    let (fake, engine) = FakePlatform::new(OsKind::Linux, 8)
        .with_process(process(42, "game", 50.0))
        .into_engine();

    let response = engine.set_process_affinity(42, &cores(&[]));
    assert_eq!(response.error, Some(ErrorKind::InvalidArgument));
    assert_eq!(fake.mutations(), 0);

    // also rejected for a pid that does not exist
    let response = engine.set_process_affinity(9999, &cores(&[]));
    assert_eq!(response.error, Some(ErrorKind::InvalidArgument));
    assert!(validate_cores(&cores(&[]), 8).is_err());
}

#[test]
fn test_affinity_flag_reflects_os_mask() {
    let (_, engine) = FakePlatform::new(OsKind::Linux, 4)
        .with_process(process(1, "pinned", 1.0))
        .with_process(process(2, "free", 1.0))
        .into_engine();
    assert!(engine.set_process_affinity(1, &cores(&[1])).success);

    let filter = ProcessFilter::default().sorted(SortKey::Pid, SortOrder::Asc);
    let page = engine.list_processes(&filter).unwrap();
    assert!(page.processes[0].affinity_set);
    assert!(!page.processes[1].affinity_set);
}

#[test]
fn test_suspend_is_idempotent() {
    let (fake, engine) = chrome_host().into_engine();

    assert!(engine.suspend_process(100).success);
    assert!(engine.suspend_process(100).success);
    assert_eq!(fake.status_of(100), Some(ProcessStatus::Suspended));

    assert!(engine.resume_process(100).success);
    assert_eq!(fake.status_of(100), Some(ProcessStatus::Running));
}

#[test]
fn test_kill_is_terminal() {
    let (fake, engine) = chrome_host().into_engine();

    assert!(engine.kill_process(300).success);
    assert_eq!(fake.status_of(300), None);

    let again = engine.kill_process(300);
    assert!(!again.success);
    assert_eq!(again.error, Some(ErrorKind::NotFound));
    assert_eq!(engine.resume_process(300).error, Some(ErrorKind::NotFound));
}

#[test]
fn test_detail_lists_direct_children_in_pid_order() {
    let (_, engine) = FakePlatform::new(OsKind::Linux, 4)
        .with_process(process(10, "launcher", 1.0))
        .with_process(child_of(31, 10, "game"))
        .with_process(child_of(12, 10, "updater"))
        .with_process(child_of(40, 31, "renderer"))
        .into_engine();

    let detail = engine.process_detail(10).unwrap();
    let children: Vec<u32> = detail.children.iter().map(|c| c.pid).collect();
    assert_eq!(children, vec![12, 31]);
    assert!(!detail.orphaned);
}

#[test]
fn test_exited_parent_is_reported_as_orphan() {
    let (fake, engine) = FakePlatform::new(OsKind::Linux, 4)
        .with_process(process(10, "launcher", 1.0))
        .with_process(child_of(31, 10, "game"))
        .into_engine();

    assert!(!engine.process_detail(31).unwrap().orphaned);
    assert!(engine.kill_process(10).success);

    let detail = engine.process_detail(31).unwrap();
    assert_eq!(detail.parent_pid, Some(10));
    assert!(detail.orphaned);
    assert_eq!(fake.status_of(10), None);
}

#[test]
fn test_detail_of_missing_pid_is_not_found() {
    let (_, engine) = chrome_host().into_engine();
    let err = engine.process_detail(4242).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[test]
fn test_boost_pins_to_performance_cores() {
    let (fake, engine) = FakePlatform::new(OsKind::Linux, 8)
        .with_performance_cores(&[0, 1, 2, 3])
        .with_process(process(42, "game", 50.0))
        .into_engine();

    let response = engine.boost_process_for_gaming(42);
    assert!(response.success, "{}", response.message);
    assert_eq!(fake.priority_of(42), PriorityClass::High);
    assert_eq!(fake.affinity_of(42), cores(&[0, 1, 2, 3]));
}

#[test]
fn test_boost_without_core_split_raises_priority_only() {
    let (fake, engine) = FakePlatform::new(OsKind::Linux, 8)
        .with_process(process(42, "game", 50.0))
        .into_engine();

    let report = engine.processes().boost_for_gaming(42).unwrap();
    assert!(report.priority_raised);
    assert!(matches!(
        report.affinity,
        rigtune::core::process::AffinityOutcome::Skipped { .. }
    ));
    assert_eq!(fake.priority_of(42), PriorityClass::High);
    assert_eq!(fake.affinity_of(42), (0..8).collect());
}

#[test]
fn test_boost_ignores_split_covering_every_core() {
    let (fake, engine) = FakePlatform::new(OsKind::Linux, 4)
        .with_performance_cores(&[0, 1, 2, 3])
        .with_process(process(42, "game", 50.0))
        .into_engine();

    assert!(engine.boost_process_for_gaming(42).success);
    assert_eq!(fake.affinity_of(42), (0..4).collect());
}

#[test]
fn test_boost_of_missing_pid_changes_nothing() {
    let (fake, engine) = FakePlatform::new(OsKind::Linux, 8)
        .with_performance_cores(&[0, 1])
        .into_engine();

    let response = engine.boost_process_for_gaming(77);
    assert_eq!(response.error, Some(ErrorKind::NotFound));
    assert_eq!(fake.mutations(), 0);
}

#[test]
fn test_concurrent_mutation_of_same_pid_is_busy() {
    let (fake, engine) = chrome_host().into_engine();
    let (entered, release) = fake.gate_suspend();

    thread::scope(|s| {
        let suspending = s.spawn(|| engine.suspend_process(100));
        entered.recv().unwrap();

        let kill = engine.kill_process(100);
        assert!(!kill.success);
        assert_eq!(kill.error, Some(ErrorKind::Busy));

        // other pids are not blocked
        assert!(engine.suspend_process(102).success);

        release.send(()).unwrap();
        assert!(suspending.join().unwrap().success);
    });

    // slot released once the first call finished
    assert!(engine.kill_process(100).success);
}

#[test]
fn test_zero_page_size_is_invalid() {
    let (_, engine) = chrome_host().into_engine();
    let err = engine
        .list_processes(&ProcessFilter::default().paged(0, 0))
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidArgument);
}

#[cfg(target_os = "linux")]
#[test]
fn test_pid_zero_is_not_found_on_the_host() {
    use rigtune::core::{Engine, EngineConfig};

    let host = rigtune::platform::current(false, false);
    let engine = Engine::with_platform(host, EngineConfig::default());

    let response = engine.set_process_affinity(0, &cores(&[0]));
    assert_eq!(response.error, Some(ErrorKind::NotFound));
    assert_eq!(
        engine.get_process_affinity(0).unwrap_err().kind(),
        ErrorKind::NotFound
    );
    assert_eq!(engine.boost_process_for_gaming(0).error, Some(ErrorKind::NotFound));
}
