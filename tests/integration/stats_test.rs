use std::thread;
use std::time::Duration;

use rigtune::commands::stats::poll;
use rigtune::core::StatCategory;
use rigtune::platform::{DiskReading, GpuReading, GpuVendor, OsKind};

use super::support::FakePlatform;

fn gpu(index: usize, name: &str, temperature: Option<f32>) -> GpuReading {
    GpuReading {
        index,
        vendor: GpuVendor::from_name(name),
        name: name.to_string(),
        utilization_percent: Some(40.0),
        temperature_celsius: temperature,
        ..Default::default()
    }
}

fn disk(name: &str, mount_point: &str, counters: Option<u64>) -> DiskReading {
    DiskReading {
        name: name.to_string(),
        mount_point: mount_point.to_string(),
        fs_type: "ext4".to_string(),
        total_bytes: 1000,
        available_bytes: 400,
        read_bytes_total: counters,
        written_bytes_total: counters,
    }
}

fn labels(sample: &rigtune::core::StatSample) -> Vec<&str> {
    sample.progress.iter().map(|p| p.label.as_str()).collect()
}

#[test]
fn test_first_network_sample_reports_zero_rate() {
    let (fake, engine) = FakePlatform::new(OsKind::Linux, 4)
        .with_interface("eth0")
        .into_engine();
    fake.add_traffic("eth0", 10_000_000, 5_000_000);

    let sample = engine.get_network_stats();
    assert_eq!(sample.detail("eth0 Download"), Some("0 B/s"));
    assert_eq!(sample.detail("eth0 Upload"), Some("0 B/s"));
}

#[test]
fn test_network_rate_follows_counter_delta() {
    let (fake, engine) = FakePlatform::new(OsKind::Linux, 4)
        .with_interface("eth0")
        .into_engine();
    engine.get_network_stats();

    thread::sleep(Duration::from_millis(20));
    fake.add_traffic("eth0", 4 * 1024 * 1024, 0);

    let sample = engine.get_network_stats();
    assert_ne!(sample.detail("eth0 Download"), Some("0 B/s"));
    assert_eq!(sample.detail("eth0 Upload"), Some("0 B/s"));
    assert_eq!(sample.progress[0].label, "eth0");
    assert_eq!(sample.progress[0].percentage, 100.0);
}

#[test]
fn test_interfaces_keep_a_stable_order() {
    let (_, engine) = FakePlatform::new(OsKind::Linux, 4)
        .with_interface("wlan0")
        .with_interface("eth0")
        .with_interface("lo")
        .into_engine();

    for _ in 0..3 {
        let labels: Vec<String> = engine
            .get_network_stats()
            .progress
            .into_iter()
            .map(|p| p.label)
            .collect();
        assert_eq!(labels, vec!["eth0", "lo", "wlan0"]);
    }
}

#[test]
fn test_gpus_in_index_order_with_optional_temperature() {
    let (_, engine) = FakePlatform::new(OsKind::Windows, 4)
        .with_gpu(gpu(1, "Intel UHD 770", None))
        .with_gpu(gpu(0, "NVIDIA GeForce RTX 4070", Some(0.0)))
        .into_engine();

    let sample = engine.get_gpu_stats();
    assert_eq!(sample.progress.len(), 2);
    assert!(sample.progress[0].label.starts_with("GPU 0"));
    assert_eq!(sample.progress[0].temperature_celsius, Some(0.0));
    assert_eq!(sample.progress[1].temperature_celsius, None);
    assert_eq!(sample.detail("GPU 1 Temperature"), Some("N/A"));
    assert_eq!(sample.percentage, Some(40.0));
}

#[test]
fn test_no_gpu_is_not_a_failure() {
    let (_, engine) = FakePlatform::new(OsKind::Linux, 4).into_engine();

    let sample = engine.get_gpu_stats();
    assert_eq!(sample.detail("GPUs"), Some("none detected"));
    assert!(engine.get_monitor_health().category(StatCategory::Gpu).healthy);
}

#[test]
fn test_storage_without_io_counters() {
    let (_, engine) = FakePlatform::new(OsKind::MacOS, 4)
        .with_disk(DiskReading {
            name: "disk1s1".to_string(),
            mount_point: "/".to_string(),
            fs_type: "apfs".to_string(),
            total_bytes: 1000,
            available_bytes: 250,
            read_bytes_total: None,
            written_bytes_total: None,
        })
        .into_engine();

    let sample = engine.get_storage_stats();
    assert_eq!(sample.percentage, Some(75.0));
    assert_eq!(sample.detail("/ Read"), Some("N/A"));
    assert_eq!(sample.progress.len(), 1);
}

#[test]
fn test_cpu_sample_without_sensors() {
    let (_, engine) = FakePlatform::new(OsKind::Linux, 8).into_engine();

    let sample = engine.get_cpu_stats();
    assert_eq!(sample.progress.len(), 8);
    assert_eq!(sample.detail("Temperature"), Some("N/A"));
    assert_eq!(sample.detail("Package Power"), Some("N/A"));
    assert_eq!(sample.detail("Cores/Threads"), Some("4/8"));
}

#[test]
fn test_system_sample() {
    let (_, engine) = FakePlatform::new(OsKind::Linux, 8)
        .elevated(true)
        .into_engine();

    let sample = engine.get_system_stats();
    assert_eq!(sample.detail("Hostname"), Some("rig"));
    assert_eq!(sample.detail("Elevated"), Some("yes"));
}

#[test]
fn test_storage_rates_across_polls() {
    let (fake, engine) = FakePlatform::new(OsKind::Linux, 4)
        .with_disk(disk("sdb1", "/data", Some(0)))
        .with_disk(disk("sda1", "/", Some(0)))
        .into_engine();

    let first = engine.get_storage_stats();
    assert_eq!(first.detail("/data Read"), Some("0 B/s"));
    assert_eq!(first.detail("/ Write"), Some("0 B/s"));
    // enumeration order, not sorted
    assert_eq!(labels(&first), vec!["/data (sdb1)", "/ (sda1)"]);

    thread::sleep(Duration::from_millis(20));
    fake.add_disk_io("/data", 8 * 1024 * 1024, 1024 * 1024);

    let second = engine.get_storage_stats();
    assert_ne!(second.detail("/data Read"), Some("0 B/s"));
    assert_ne!(second.detail("/data Write"), Some("0 B/s"));
    assert_eq!(second.detail("/ Read"), Some("0 B/s"));
    assert_eq!(labels(&second), labels(&first));

    fake.unmount("/data");
    let third = engine.get_storage_stats();
    assert_eq!(labels(&third), vec!["/ (sda1)"]);
    assert_eq!(third.detail("/data Read"), None);
    assert_eq!(third.detail("Drives"), Some("1"));

    // remounted drive starts from a fresh baseline
    thread::sleep(Duration::from_millis(20));
    fake.mount(disk("sdb1", "/data", Some(64 * 1024 * 1024)));
    let fourth = engine.get_storage_stats();
    assert_eq!(fourth.detail("/data Read"), Some("0 B/s"));
    assert_eq!(labels(&fourth), vec!["/ (sda1)", "/data (sdb1)"]);
}

#[test]
fn test_gpu_labels_are_stable_across_polls() {
    let (fake, engine) = FakePlatform::new(OsKind::Windows, 4)
        .with_gpu(gpu(2, "AMD Radeon RX 7600", Some(55.0)))
        .with_gpu(gpu(0, "NVIDIA GeForce RTX 4070", Some(61.0)))
        .with_gpu(gpu(1, "Intel UHD 770", None))
        .into_engine();

    let expected = vec![
        "GPU 0: NVIDIA GeForce RTX 4070",
        "GPU 1: Intel UHD 770",
        "GPU 2: AMD Radeon RX 7600",
    ];
    for _ in 0..3 {
        let sample = engine.get_gpu_stats();
        assert_eq!(labels(&sample), expected);
        assert_eq!(sample.detail("GPUs"), Some("3"));
    }

    fake.remove_gpu(1);
    let sample = engine.get_gpu_stats();
    assert_eq!(
        labels(&sample),
        vec!["GPU 0: NVIDIA GeForce RTX 4070", "GPU 2: AMD Radeon RX 7600"]
    );
}

#[test]
fn test_polling_one_engine_turns_counters_into_rates() {
    let (fake, engine) = FakePlatform::new(OsKind::Linux, 4)
        .with_interface("eth0")
        .into_engine();

    let mut downloads = Vec::new();
    poll(
        &engine,
        &[StatCategory::Network],
        Duration::from_millis(20),
        3,
        |round, samples| {
            downloads.push(samples[0].detail("eth0 Download").map(str::to_string));
            if round == 0 {
                fake.add_traffic("eth0", 2 * 1024 * 1024, 0);
            }
            Ok(())
        },
    )
    .unwrap();

    assert_eq!(downloads.len(), 3);
    assert_eq!(downloads[0].as_deref(), Some("0 B/s"));
    assert_ne!(downloads[1].as_deref(), Some("0 B/s"));
    // idle again once the traffic stopped
    assert_eq!(downloads[2].as_deref(), Some("0 B/s"));
}

#[test]
fn test_zero_rounds_samples_nothing() {
    let (fake, engine) = FakePlatform::new(OsKind::Linux, 4).into_engine();
    fake.fail("cpu");

    let mut rounds = 0;
    poll(&engine, &StatCategory::ALL, Duration::ZERO, 0, |_, _| {
        rounds += 1;
        Ok(())
    })
    .unwrap();

    assert_eq!(rounds, 0);
    assert_eq!(engine.get_monitor_health().category(StatCategory::Cpu).error_count, 0);
}
