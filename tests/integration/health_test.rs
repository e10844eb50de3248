use std::time::Duration;

use rigtune::commands::stats::poll;
use rigtune::core::StatCategory;
use rigtune::platform::OsKind;

use super::support::FakePlatform;

#[test]
fn test_reset_then_single_failure() {
    let (fake, engine) = FakePlatform::new(OsKind::Linux, 4).into_engine();

    fake.fail("cpu");
    fake.fail("network");
    engine.get_cpu_stats();
    engine.get_network_stats();
    engine.get_network_stats();

    assert!(engine.reset_monitor_health().success);
    let snapshot = engine.get_monitor_health();
    assert!(snapshot.categories.values().all(|h| h.error_count == 0));

    fake.recover("cpu");
    fake.recover("network");
    for category in StatCategory::ALL {
        engine.get_stats(category);
    }

    fake.fail("storage");
    engine.get_storage_stats();

    let snapshot = engine.get_monitor_health();
    for (category, health) in &snapshot.categories {
        if *category == StatCategory::Storage {
            assert!(!health.healthy);
            assert_eq!(health.error_count, 1);
        } else {
            assert!(health.healthy, "{} should be healthy", category);
            assert_eq!(health.error_count, 0, "{}", category);
        }
    }
    assert!(!snapshot.overall_healthy);
}

#[test]
fn test_reset_keeps_flags_until_next_sample() {
    let (fake, engine) = FakePlatform::new(OsKind::Linux, 4).into_engine();

    fake.fail("memory");
    engine.get_memory_stats();
    engine.reset_monitor_health();

    let memory = engine.get_monitor_health().category(StatCategory::Memory);
    assert_eq!(memory.error_count, 0);
    assert!(!memory.healthy);

    fake.recover("memory");
    engine.get_memory_stats();
    assert!(engine.get_monitor_health().overall_healthy);
}

#[test]
fn test_counts_accumulate_across_recoveries() {
    let (fake, engine) = FakePlatform::new(OsKind::Linux, 4).into_engine();

    fake.fail("gpu");
    engine.get_gpu_stats();
    fake.recover("gpu");
    engine.get_gpu_stats();
    fake.fail("gpu");
    engine.get_gpu_stats();

    let gpu = engine.get_monitor_health().category(StatCategory::Gpu);
    assert_eq!(gpu.error_count, 2);
    assert!(!gpu.healthy);
}

#[test]
fn test_failed_sample_falls_back_to_last_good() {
    let (fake, engine) = FakePlatform::new(OsKind::Linux, 4).into_engine();

    let good = engine.get_memory_stats();
    fake.fail("memory");
    let served = engine.get_memory_stats();

    assert_eq!(served, good);
    assert!(!served.is_unavailable());
}

#[test]
fn test_failure_before_any_success_yields_placeholder() {
    let (fake, engine) = FakePlatform::new(OsKind::Linux, 4).into_engine();

    fake.fail("system");
    let sample = engine.get_system_stats();
    assert!(sample.is_unavailable());
    assert_eq!(sample.category, StatCategory::System);
}

#[test]
fn test_health_snapshot_serializes_category_keys() {
    let (_, engine) = FakePlatform::new(OsKind::Linux, 4).into_engine();
    let json = serde_json::to_value(engine.get_monitor_health()).unwrap();

    assert_eq!(json["categories"]["gpu"]["healthy"], true);
    assert_eq!(json["overall_healthy"], true);
}

#[test]
fn test_polling_accumulates_failures_on_one_engine() {
    let (fake, engine) = FakePlatform::new(OsKind::Linux, 4).into_engine();
    fake.fail("gpu");

    poll(&engine, &StatCategory::ALL, Duration::ZERO, 3, |_, samples| {
        assert_eq!(samples.len(), StatCategory::ALL.len());
        Ok(())
    })
    .unwrap();

    let snapshot = engine.get_monitor_health();
    assert_eq!(snapshot.category(StatCategory::Gpu).error_count, 3);
    assert!(!snapshot.category(StatCategory::Gpu).healthy);
    assert_eq!(snapshot.category(StatCategory::Cpu).error_count, 0);
    assert!(!snapshot.overall_healthy);
}
