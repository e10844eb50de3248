use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Operating system family an implementation (or optimization) targets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OsKind {
    Windows,
    Linux,
    #[serde(rename = "macos")]
    MacOS,
    Other,
}

impl fmt::Display for OsKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            OsKind::Windows => "Windows",
            OsKind::Linux => "Linux",
            OsKind::MacOS => "macOS",
            OsKind::Other => "Unknown",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlatformInfo {
    pub os: String,
    pub version: String,
    pub arch: String,
}

impl PlatformInfo {
    /// Describe the running host using sysinfo's OS metadata
    pub fn detect(kind: OsKind) -> Self {
        Self {
            os: kind.to_string(),
            version: sysinfo::System::os_version().unwrap_or_else(|| "Unknown".to_string()),
            arch: std::env::consts::ARCH.to_string(),
        }
    }
}

/// Coarse scheduling state of a process
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProcessStatus {
    Running,
    Sleeping,
    Suspended,
    Stopped,
}

impl FromStr for ProcessStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "running" => Ok(ProcessStatus::Running),
            "sleeping" | "idle" => Ok(ProcessStatus::Sleeping),
            "suspended" => Ok(ProcessStatus::Suspended),
            "stopped" | "zombie" | "dead" => Ok(ProcessStatus::Stopped),
            other => Err(format!("unknown process status '{}'", other)),
        }
    }
}

impl fmt::Display for ProcessStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ProcessStatus::Running => "running",
            ProcessStatus::Sleeping => "sleeping",
            ProcessStatus::Suspended => "suspended",
            ProcessStatus::Stopped => "stopped",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemoryUsage {
    pub working_set: u64,
    pub private: u64,
    pub virtual_bytes: u64,
    pub pagefile: u64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IoCounters {
    pub read_bytes: u64,
    pub write_bytes: u64,
    pub read_ops: u64,
    pub write_ops: u64,
}

/// One process as reported by the OS at the moment of the query
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessRecord {
    pub pid: u32,
    pub parent_pid: Option<u32>,
    pub name: String,
    pub exe_path: String,
    pub status: ProcessStatus,
    /// Share of total machine capacity, 0-100
    pub cpu_usage_percent: f32,
    pub memory: MemoryUsage,
    pub handle_count: u32,
    pub thread_count: u32,
    pub is_suspended: bool,
    pub session_id: u32,
    pub io: IoCounters,
    pub run_time_secs: u64,
}

impl ProcessRecord {
    pub fn new(pid: u32, name: impl Into<String>) -> Self {
        Self {
            pid,
            parent_pid: None,
            name: name.into(),
            exe_path: String::new(),
            status: ProcessStatus::Running,
            cpu_usage_percent: 0.0,
            memory: MemoryUsage::default(),
            handle_count: 0,
            thread_count: 0,
            is_suspended: false,
            session_id: 0,
            io: IoCounters::default(),
            run_time_secs: 0,
        }
    }
}

/// Scheduling priority, mapped onto priority classes (Windows) or nice values (Unix)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PriorityClass {
    Idle,
    BelowNormal,
    Normal,
    AboveNormal,
    High,
    Realtime,
}

impl PriorityClass {
    pub fn nice(self) -> i32 {
        match self {
            PriorityClass::Idle => 19,
            PriorityClass::BelowNormal => 10,
            PriorityClass::Normal => 0,
            PriorityClass::AboveNormal => -5,
            PriorityClass::High => -10,
            PriorityClass::Realtime => -20,
        }
    }

    pub fn from_nice(nice: i32) -> Self {
        match nice {
            n if n >= 15 => PriorityClass::Idle,
            n if n >= 5 => PriorityClass::BelowNormal,
            n if n > -5 => PriorityClass::Normal,
            n if n > -10 => PriorityClass::AboveNormal,
            n if n > -20 => PriorityClass::High,
            _ => PriorityClass::Realtime,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SensorKind {
    CpuTemperature,
    CpuPackagePower,
}

impl fmt::Display for SensorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SensorKind::CpuTemperature => f.write_str("cpu temperature"),
            SensorKind::CpuPackagePower => f.write_str("cpu package power"),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CpuReading {
    pub brand: String,
    pub global_usage: f32,
    pub per_core_usage: Vec<f32>,
    pub frequencies_mhz: Vec<u64>,
    pub physical_cores: Option<usize>,
    /// Per logical core, `None` where no sensor maps to the core
    pub core_temperatures: Vec<Option<f32>>,
    pub load_average: Option<(f64, f64, f64)>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemoryReading {
    pub total_bytes: u64,
    pub used_bytes: u64,
    pub available_bytes: u64,
    pub swap_total_bytes: u64,
    pub swap_used_bytes: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiskReading {
    pub name: String,
    pub mount_point: String,
    pub fs_type: String,
    pub total_bytes: u64,
    pub available_bytes: u64,
    /// Cumulative counters; `None` when the OS does not expose them
    pub read_bytes_total: Option<u64>,
    pub written_bytes_total: Option<u64>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InterfaceReading {
    pub name: String,
    pub mac_address: String,
    pub rx_bytes_total: u64,
    pub tx_bytes_total: u64,
    pub rx_packets_total: u64,
    pub tx_packets_total: u64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum GpuVendor {
    Nvidia,
    Amd,
    Intel,
    Apple,
    #[default]
    Unknown,
}

impl GpuVendor {
    pub fn from_name(name: &str) -> Self {
        let name = name.to_ascii_lowercase();
        if name.contains("nvidia") || name.contains("geforce") {
            GpuVendor::Nvidia
        } else if name.contains("amd") || name.contains("radeon") {
            GpuVendor::Amd
        } else if name.contains("intel") {
            GpuVendor::Intel
        } else if name.contains("apple") {
            GpuVendor::Apple
        } else {
            GpuVendor::Unknown
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GpuReading {
    pub index: usize,
    pub vendor: GpuVendor,
    pub name: String,
    pub utilization_percent: Option<f32>,
    pub memory_used_bytes: Option<u64>,
    pub memory_total_bytes: Option<u64>,
    pub temperature_celsius: Option<f32>,
    pub power_watts: Option<f32>,
    pub fan_speed_percent: Option<u32>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SystemReading {
    pub os_name: String,
    pub os_version: String,
    pub kernel_version: String,
    pub hostname: String,
    pub uptime_secs: u64,
    pub process_count: usize,
    pub logical_cores: usize,
    pub elevated: bool,
}

/// OS-level tuning knobs an optimization can read and write
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SettingKey {
    GameDvr,
    FullscreenOptimizations,
    GameMode,
    PowerScheme,
    Transparency,
    MinimizeAnimation,
    Telemetry,
    Cortana,
    CpuGovernor,
    Swappiness,
    SchedAutogroup,
    SpotlightIndexing,
    AppNap,
}

impl fmt::Display for SettingKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SettingKey::GameDvr => "game_dvr",
            SettingKey::FullscreenOptimizations => "fullscreen_optimizations",
            SettingKey::GameMode => "game_mode",
            SettingKey::PowerScheme => "power_scheme",
            SettingKey::Transparency => "transparency",
            SettingKey::MinimizeAnimation => "minimize_animation",
            SettingKey::Telemetry => "telemetry",
            SettingKey::Cortana => "cortana",
            SettingKey::CpuGovernor => "cpu_governor",
            SettingKey::Swappiness => "swappiness",
            SettingKey::SchedAutogroup => "sched_autogroup",
            SettingKey::SpotlightIndexing => "spotlight_indexing",
            SettingKey::AppNap => "app_nap",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SettingValue {
    Number(i64),
    Text(String),
}

impl SettingValue {
    pub fn text(value: impl Into<String>) -> Self {
        SettingValue::Text(value.into())
    }

    pub fn as_number(&self) -> Option<i64> {
        match self {
            SettingValue::Number(n) => Some(*n),
            SettingValue::Text(s) => s.trim().parse().ok(),
        }
    }

    /// Settings compare loosely: "10" and 10 are the same value
    pub fn matches(&self, other: &SettingValue) -> bool {
        match (self.as_number(), other.as_number()) {
            (Some(a), Some(b)) => a == b,
            _ => self.to_string().trim().eq_ignore_ascii_case(other.to_string().trim()),
        }
    }
}

impl fmt::Display for SettingValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SettingValue::Number(n) => write!(f, "{}", n),
            SettingValue::Text(s) => f.write_str(s),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OneShotAction {
    ClearMemoryCache,
    ClearDnsCache,
}

impl fmt::Display for OneShotAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OneShotAction::ClearMemoryCache => f.write_str("clear memory cache"),
            OneShotAction::ClearDnsCache => f.write_str("clear dns cache"),
        }
    }
}
