//! The built-in optimization catalog.

use std::fmt;

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

use crate::platform::{OneShotAction, OsKind, PriorityClass, SettingKey, SettingValue};

/// Built-in Windows "High performance" power scheme
pub const HIGH_PERFORMANCE_SCHEME: &str = "8c5e7fda-e8bf-4a96-9a85-a6e23a8c635c";
/// Built-in Windows "Balanced" power scheme
pub const BALANCED_SCHEME: &str = "381b4222-f694-41f0-9685-ff5bb260df2e";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scope {
    Windows,
    Linux,
    #[serde(rename = "macos")]
    MacOS,
    All,
}

impl Scope {
    pub fn includes(&self, os: OsKind) -> bool {
        matches!(
            (self, os),
            (Scope::All, _)
                | (Scope::Windows, OsKind::Windows)
                | (Scope::Linux, OsKind::Linux)
                | (Scope::MacOS, OsKind::MacOS)
        )
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Scope::Windows => "Windows",
            Scope::Linux => "Linux",
            Scope::MacOS => "macOS",
            Scope::All => "all platforms",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RiskLevel::Low => "low",
            RiskLevel::Medium => "medium",
            RiskLevel::High => "high",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    GamingPerformance,
    SystemPerformance,
    PrivacyTelemetry,
    ProcessManagement,
    Maintenance,
}

impl Category {
    pub fn display_name(&self) -> &'static str {
        match self {
            Category::GamingPerformance => "Gaming Performance",
            Category::SystemPerformance => "System Performance",
            Category::PrivacyTelemetry => "Privacy & Telemetry",
            Category::ProcessManagement => "Process Management",
            Category::Maintenance => "Maintenance",
        }
    }
}

/// What applying an optimization actually does
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    /// Write `applied` to an OS setting; reverting writes the remembered
    /// previous value, or `default` when none was recorded
    Setting {
        key: SettingKey,
        applied: SettingValue,
        default: SettingValue,
    },
    /// Change the engine's own scheduling priority
    EnginePriority {
        applied: PriorityClass,
        default: PriorityClass,
    },
    /// Fire-and-forget maintenance with no lasting state
    OneShot(OneShotAction),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Optimization {
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub category: Category,
    pub scope: Scope,
    pub requires_admin: bool,
    pub is_reversible: bool,
    pub risk_level: RiskLevel,
    pub needs_restart: bool,
    pub effect: Effect,
}

impl Optimization {
    /// The effect belongs to the calling process and ends when it exits
    pub fn is_process_scoped(&self) -> bool {
        matches!(self.effect, Effect::EnginePriority { .. })
    }

    fn setting(
        id: &'static str,
        name: &'static str,
        description: &'static str,
        category: Category,
        scope: Scope,
        key: SettingKey,
        applied: SettingValue,
        default: SettingValue,
    ) -> Self {
        Self {
            id,
            name,
            description,
            category,
            scope,
            requires_admin: false,
            is_reversible: true,
            risk_level: RiskLevel::Low,
            needs_restart: false,
            effect: Effect::Setting {
                key,
                applied,
                default,
            },
        }
    }

    fn one_shot(
        id: &'static str,
        name: &'static str,
        description: &'static str,
        action: OneShotAction,
    ) -> Self {
        Self {
            id,
            name,
            description,
            category: Category::Maintenance,
            scope: Scope::All,
            requires_admin: false,
            is_reversible: false,
            risk_level: RiskLevel::Low,
            needs_restart: false,
            effect: Effect::OneShot(action),
        }
    }

    fn admin(mut self) -> Self {
        self.requires_admin = true;
        self
    }

    fn risk(mut self, level: RiskLevel) -> Self {
        self.risk_level = level;
        self
    }

    fn restart(mut self) -> Self {
        self.needs_restart = true;
        self
    }
}

static BUILTIN: Lazy<Vec<Optimization>> = Lazy::new(|| {
    use Category::*;
    use SettingValue::Number;

    vec![
        // Windows
        Optimization::setting(
            "disable_game_dvr",
            "Disable Game DVR",
            "Disables Windows Game DVR background recording",
            GamingPerformance,
            Scope::Windows,
            SettingKey::GameDvr,
            Number(0),
            Number(1),
        ),
        Optimization::setting(
            "disable_fullscreen_optimization",
            "Disable Fullscreen Optimization",
            "Disables fullscreen optimization for exclusive fullscreen games",
            GamingPerformance,
            Scope::Windows,
            SettingKey::FullscreenOptimizations,
            Number(2),
            Number(0),
        )
        .admin(),
        Optimization::setting(
            "enable_game_mode",
            "Enable Game Mode",
            "Enables Windows Game Mode for better resource allocation",
            GamingPerformance,
            Scope::Windows,
            SettingKey::GameMode,
            Number(1),
            Number(0),
        ),
        Optimization::setting(
            "high_performance_power_plan",
            "High Performance Power Plan",
            "Switches to the High Performance power plan",
            GamingPerformance,
            Scope::Windows,
            SettingKey::PowerScheme,
            SettingValue::text(HIGH_PERFORMANCE_SCHEME),
            SettingValue::text(BALANCED_SCHEME),
        )
        .admin()
        .risk(RiskLevel::Medium),
        Optimization::setting(
            "disable_transparency",
            "Disable Transparency Effects",
            "Disables visual transparency effects",
            SystemPerformance,
            Scope::Windows,
            SettingKey::Transparency,
            Number(0),
            Number(1),
        ),
        Optimization::setting(
            "disable_animations",
            "Disable Animations",
            "Disables window minimize/maximize animations",
            SystemPerformance,
            Scope::Windows,
            SettingKey::MinimizeAnimation,
            SettingValue::text("0"),
            SettingValue::text("1"),
        )
        .restart(),
        Optimization::setting(
            "disable_telemetry",
            "Disable Telemetry",
            "Limits Windows diagnostic data collection by policy",
            PrivacyTelemetry,
            Scope::Windows,
            SettingKey::Telemetry,
            Number(0),
            Number(1),
        )
        .admin()
        .risk(RiskLevel::Medium),
        Optimization::setting(
            "disable_cortana",
            "Disable Cortana",
            "Disables the Cortana assistant by policy",
            PrivacyTelemetry,
            Scope::Windows,
            SettingKey::Cortana,
            Number(0),
            Number(1),
        )
        .admin()
        .risk(RiskLevel::High)
        .restart(),
        // Linux
        Optimization::setting(
            "enable_performance_governor",
            "Performance CPU Governor",
            "Sets the cpufreq governor of every core to performance",
            GamingPerformance,
            Scope::Linux,
            SettingKey::CpuGovernor,
            SettingValue::text("performance"),
            SettingValue::text("powersave"),
        )
        .admin()
        .risk(RiskLevel::Medium),
        Optimization::setting(
            "optimize_swappiness",
            "Optimize Swappiness",
            "Sets vm.swappiness to 10 to keep game memory resident",
            GamingPerformance,
            Scope::Linux,
            SettingKey::Swappiness,
            Number(10),
            Number(60),
        )
        .admin(),
        Optimization::setting(
            "disable_sched_autogroup",
            "Disable Scheduler Autogroup",
            "Stops the scheduler from grouping tasks by session",
            SystemPerformance,
            Scope::Linux,
            SettingKey::SchedAutogroup,
            Number(0),
            Number(1),
        )
        .admin()
        .risk(RiskLevel::Medium),
        // macOS
        Optimization::setting(
            "disable_spotlight",
            "Disable Spotlight Indexing",
            "Turns off Spotlight indexing on all volumes",
            GamingPerformance,
            Scope::MacOS,
            SettingKey::SpotlightIndexing,
            SettingValue::text("off"),
            SettingValue::text("on"),
        )
        .admin()
        .risk(RiskLevel::Medium),
        Optimization::setting(
            "disable_app_nap",
            "Disable App Nap",
            "Keeps background applications from being throttled",
            SystemPerformance,
            Scope::MacOS,
            SettingKey::AppNap,
            Number(1),
            Number(0),
        ),
        // Everywhere
        Optimization {
            id: "set_high_priority",
            name: "High Priority Mode",
            description: "Raises the calling process to high priority until it exits",
            category: ProcessManagement,
            scope: Scope::All,
            requires_admin: false,
            is_reversible: true,
            risk_level: RiskLevel::Low,
            needs_restart: false,
            effect: Effect::EnginePriority {
                applied: PriorityClass::High,
                default: PriorityClass::Normal,
            },
        },
        Optimization::one_shot(
            "clear_memory_cache",
            "Clear Memory Cache",
            "Releases cached and standby memory back to the system",
            OneShotAction::ClearMemoryCache,
        )
        .admin(),
        Optimization::one_shot(
            "clear_dns_cache",
            "Clear DNS Cache",
            "Flushes the resolver cache",
            OneShotAction::ClearDnsCache,
        ),
    ]
});

/// Every built-in optimization, in display order
pub fn builtin() -> &'static [Optimization] {
    &BUILTIN
}
