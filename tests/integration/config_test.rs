use rigtune::core::{Engine, EngineConfig, ProcessFilter};
use rigtune::platform::OsKind;
use tempfile::TempDir;

use super::support::{process, FakePlatform};

#[test]
fn test_config_default() {
    let config = EngineConfig::default();
    assert_eq!(config.default_per_page, 50);
    assert!(config.collect_gpu);
    assert!(!config.hide_kernel_threads);
}

#[test]
fn test_config_load_nonexistent_returns_default() {
    let temp_dir = TempDir::new().unwrap();
    let config = EngineConfig::load_from(&temp_dir.path().join("missing.json")).unwrap();
    assert_eq!(config, EngineConfig::default());
}

#[test]
fn test_config_corrupt_file_returns_default() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("config.json");
    std::fs::write(&path, "{ not json").unwrap();

    assert_eq!(EngineConfig::load_from(&path).unwrap(), EngineConfig::default());
}

#[test]
fn test_config_roundtrip() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("nested").join("config.json");

    let config = EngineConfig {
        default_per_page: 25,
        collect_gpu: false,
        hide_kernel_threads: true,
    };
    config.save_to(&path).unwrap();

    assert_eq!(EngineConfig::load_from(&path).unwrap(), config);
}

#[test]
fn test_default_page_size_applies_to_listings() {
    let mut fake = FakePlatform::new(OsKind::Linux, 4);
    for pid in 1..=30 {
        fake = fake.with_process(process(pid, "worker", 1.0));
    }
    let config = EngineConfig {
        default_per_page: 7,
        ..Default::default()
    };
    let engine = Engine::with_platform(std::sync::Arc::new(fake), config);

    let page = engine.list_processes(&ProcessFilter::default()).unwrap();
    assert_eq!(page.processes.len(), 7);
    assert_eq!(page.total_count, 30);
}
