use rigtune::core::optimization::{Category, OptimizationRegistry};
use rigtune::core::Engine;
use rigtune::platform::{OneShotAction, OsKind, SettingKey, SettingValue};
use rigtune::ErrorKind;

use super::support::FakePlatform;

fn applied(engine: &Engine, id: &str) -> Option<bool> {
    engine
        .get_available_optimizations()
        .iter()
        .flat_map(|g| g.items.iter())
        .find(|item| item.id == id)
        .map(|item| item.applied)
}

fn ids(engine: &Engine) -> Vec<String> {
    engine
        .get_available_optimizations()
        .iter()
        .flat_map(|g| g.items.iter().map(|i| i.id.clone()))
        .collect()
}

#[test]
fn test_listing_is_scoped_to_current_os() {
    let (_, engine) = FakePlatform::new(OsKind::Linux, 4).into_engine();

    assert_eq!(
        ids(&engine),
        vec![
            "enable_performance_governor",
            "optimize_swappiness",
            "disable_sched_autogroup",
            "set_high_priority",
            "clear_memory_cache",
            "clear_dns_cache",
        ]
    );

    let categories: Vec<Category> = engine
        .get_available_optimizations()
        .iter()
        .map(|g| g.category)
        .collect();
    assert_eq!(
        categories,
        vec![
            Category::GamingPerformance,
            Category::SystemPerformance,
            Category::ProcessManagement,
            Category::Maintenance,
        ]
    );
}

#[test]
fn test_windows_listing_includes_registry_tweaks() {
    let (_, engine) = FakePlatform::new(OsKind::Windows, 4).into_engine();
    let ids = ids(&engine);
    assert!(ids.contains(&"disable_game_dvr".to_string()));
    assert!(ids.contains(&"disable_fullscreen_optimization".to_string()));
    assert!(!ids.contains(&"optimize_swappiness".to_string()));
}

#[test]
fn test_applied_state_is_probed_from_os() {
    let (fake, engine) = FakePlatform::new(OsKind::Linux, 4)
        .with_setting(SettingKey::Swappiness, SettingValue::Number(60))
        .into_engine();
    assert_eq!(applied(&engine, "optimize_swappiness"), Some(false));

    // changed outside the engine
    fake.set_setting(SettingKey::Swappiness, SettingValue::text("10"));
    assert_eq!(applied(&engine, "optimize_swappiness"), Some(true));
}

#[test]
fn test_apply_is_idempotent() {
    let (fake, engine) = FakePlatform::new(OsKind::Linux, 4)
        .elevated(true)
        .with_setting(SettingKey::Swappiness, SettingValue::Number(60))
        .into_engine();

    assert!(engine.apply_optimization("optimize_swappiness").success);
    let first = fake.setting(SettingKey::Swappiness);
    assert!(engine.apply_optimization("optimize_swappiness").success);

    assert_eq!(fake.setting(SettingKey::Swappiness), first);
    assert_eq!(applied(&engine, "optimize_swappiness"), Some(true));
}

#[test]
fn test_apply_then_revert_clears_applied_on_every_os() {
    for kind in [OsKind::Windows, OsKind::Linux, OsKind::MacOS] {
        let (_, engine) = FakePlatform::new(kind, 4).elevated(true).into_engine();

        let reversible: Vec<String> = engine
            .get_available_optimizations()
            .iter()
            .flat_map(|g| g.items.iter())
            .filter(|i| i.is_reversible)
            .map(|i| i.id.clone())
            .collect();
        assert!(!reversible.is_empty());

        for id in reversible {
            let response = engine.apply_optimization(&id);
            assert!(response.success, "{} on {}: {}", id, kind, response.message);
            assert_eq!(applied(&engine, &id), Some(true), "{} on {}", id, kind);

            let response = engine.revert_optimization(&id);
            assert!(response.success, "{} on {}: {}", id, kind, response.message);
            assert_eq!(applied(&engine, &id), Some(false), "{} on {}", id, kind);

            // revert is idempotent too
            assert!(engine.revert_optimization(&id).success);
        }
    }
}

#[test]
fn test_revert_restores_value_seen_before_apply() {
    let (fake, engine) = FakePlatform::new(OsKind::Linux, 4)
        .elevated(true)
        .with_setting(SettingKey::Swappiness, SettingValue::Number(35))
        .into_engine();

    assert!(engine.apply_optimization("optimize_swappiness").success);
    assert!(engine.apply_optimization("optimize_swappiness").success);
    assert!(engine.revert_optimization("optimize_swappiness").success);

    assert_eq!(
        fake.setting(SettingKey::Swappiness),
        Some(SettingValue::Number(35))
    );
}

#[test]
fn test_revert_without_history_writes_catalog_default() {
    let (fake, engine) = FakePlatform::new(OsKind::Linux, 4)
        .elevated(true)
        .with_setting(SettingKey::CpuGovernor, SettingValue::text("performance"))
        .into_engine();

    assert!(engine.revert_optimization("enable_performance_governor").success);
    assert_eq!(
        fake.setting(SettingKey::CpuGovernor),
        Some(SettingValue::text("powersave"))
    );
}

#[test]
fn test_revert_of_one_shot_never_mutates() {
    let (fake, engine) = FakePlatform::new(OsKind::Linux, 4)
        .elevated(true)
        .into_engine();

    for id in ["clear_memory_cache", "clear_dns_cache"] {
        let response = engine.revert_optimization(id);
        assert!(!response.success);
        assert_eq!(response.error, Some(ErrorKind::NotReversible));
    }
    assert_eq!(fake.mutations(), 0);
    assert!(fake.actions().is_empty());
}

#[test]
fn test_one_shot_runs_and_never_reports_applied() {
    let (fake, engine) = FakePlatform::new(OsKind::MacOS, 4).into_engine();

    let response = engine.apply_optimization("clear_dns_cache");
    assert!(response.success, "{}", response.message);
    assert_eq!(fake.actions(), vec![OneShotAction::ClearDnsCache]);
    assert_eq!(applied(&engine, "clear_dns_cache"), Some(false));
}

#[test]
fn test_admin_optimizations_need_elevation() {
    let (fake, engine) = FakePlatform::new(OsKind::Linux, 4)
        .elevated(false)
        .with_setting(SettingKey::Swappiness, SettingValue::Number(60))
        .into_engine();

    let response = engine.apply_optimization("optimize_swappiness");
    assert_eq!(response.error, Some(ErrorKind::PermissionDenied));
    let response = engine.revert_optimization("optimize_swappiness");
    assert_eq!(response.error, Some(ErrorKind::PermissionDenied));

    assert_eq!(fake.mutations(), 0);
    assert_eq!(
        fake.setting(SettingKey::Swappiness),
        Some(SettingValue::Number(60))
    );
}

#[test]
fn test_foreign_and_unknown_ids() {
    let (fake, engine) = FakePlatform::new(OsKind::Linux, 4)
        .elevated(true)
        .into_engine();

    let response = engine.apply_optimization("disable_game_dvr");
    assert_eq!(response.error, Some(ErrorKind::PlatformMismatch));
    let response = engine.revert_optimization("disable_spotlight");
    assert_eq!(response.error, Some(ErrorKind::PlatformMismatch));
    let response = engine.apply_optimization("turbo_mode");
    assert_eq!(response.error, Some(ErrorKind::NotFound));

    assert_eq!(fake.mutations(), 0);
}

#[test]
fn test_restart_flag_is_reported() {
    let (_, engine) = FakePlatform::new(OsKind::Windows, 4).into_engine();

    let response = engine.apply_optimization("disable_animations");
    assert!(response.success, "{}", response.message);
    assert!(response.needs_restart);

    let response = engine.apply_optimization("disable_game_dvr");
    assert!(!response.needs_restart);
}

#[test]
fn test_custom_catalog() {
    let fake = std::sync::Arc::new(FakePlatform::new(OsKind::Linux, 2));
    let catalog = rigtune::core::optimization::catalog::builtin()
        .iter()
        .filter(|o| o.id == "clear_dns_cache")
        .cloned()
        .collect();
    let registry = OptimizationRegistry::with_catalog(fake.clone(), catalog);

    let groups = registry.list_available();
    assert_eq!(groups.len(), 1);
    assert_eq!(groups[0].items[0].id, "clear_dns_cache");
    assert!(registry.apply("optimize_swappiness").is_err());
}
