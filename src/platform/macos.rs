//! macOS platform. The kernel offers no public affinity API, so affinity
//! stays on the trait's unsupported default.

use std::collections::BTreeSet;

use super::types::*;
use super::{command, elevation, gpu, unix, Platform, PlatformError, PlatformResult, SysinfoProbe};

pub struct MacPlatform {
    probe: SysinfoProbe,
    collect_gpu: bool,
}

impl MacPlatform {
    pub fn new(collect_gpu: bool) -> Self {
        Self {
            probe: SysinfoProbe::new(),
            collect_gpu,
        }
    }

    pub fn hiding_kernel_threads(mut self, hide: bool) -> Self {
        self.probe = self.probe.hiding_kernel_threads(hide);
        self
    }

    fn sysctl_number(name: &str) -> Option<usize> {
        command::run("sysctl", &["-n", name]).ok()?.trim().parse().ok()
    }
}

impl Platform for MacPlatform {
    fn kind(&self) -> OsKind {
        OsKind::MacOS
    }

    fn info(&self) -> PlatformInfo {
        PlatformInfo::detect(OsKind::MacOS)
    }

    fn is_elevated(&self) -> bool {
        elevation::is_elevated()
    }

    fn core_count(&self) -> usize {
        self.probe.logical_cores()
    }

    /// Apple silicon numbers performance cores first; perflevel0 is the
    /// performance cluster
    fn performance_cores(&self) -> PlatformResult<Option<BTreeSet<usize>>> {
        let levels = Self::sysctl_number("hw.nperflevels").unwrap_or(1);
        if levels < 2 {
            return Ok(None);
        }
        Ok(Self::sysctl_number("hw.perflevel0.logicalcpu")
            .filter(|&n| n > 0 && n < self.core_count())
            .map(|n| (0..n).collect()))
    }

    fn list_processes(&self) -> PlatformResult<Vec<ProcessRecord>> {
        self.probe.list_processes()
    }

    fn get_priority(&self, pid: u32) -> PlatformResult<PriorityClass> {
        unix::get_priority(pid)
    }

    fn set_priority(&self, pid: u32, class: PriorityClass) -> PlatformResult<()> {
        unix::set_priority(pid, class)
    }

    fn suspend(&self, pid: u32) -> PlatformResult<()> {
        unix::suspend(pid)
    }

    fn resume(&self, pid: u32) -> PlatformResult<()> {
        unix::resume(pid)
    }

    fn terminate(&self, pid: u32) -> PlatformResult<()> {
        unix::terminate(pid)
    }

    fn read_sensor(&self, kind: SensorKind) -> PlatformResult<f64> {
        match kind {
            SensorKind::CpuTemperature => self
                .probe
                .cpu_temperature()
                .map(f64::from)
                .ok_or_else(|| PlatformError::unsupported("cpu temperature sensor")),
            SensorKind::CpuPackagePower => {
                Err(PlatformError::unsupported("cpu package power on macOS"))
            }
        }
    }

    fn read_cpu(&self) -> PlatformResult<CpuReading> {
        self.probe.read_cpu()
    }

    fn read_memory(&self) -> PlatformResult<MemoryReading> {
        self.probe.read_memory()
    }

    fn read_disks(&self) -> PlatformResult<Vec<DiskReading>> {
        self.probe.read_disks()
    }

    fn read_networks(&self) -> PlatformResult<Vec<InterfaceReading>> {
        self.probe.read_networks()
    }

    fn read_gpus(&self) -> PlatformResult<Vec<GpuReading>> {
        if !self.collect_gpu {
            return Ok(Vec::new());
        }
        Ok(gpu::enumerate())
    }

    fn read_system(&self) -> PlatformResult<SystemReading> {
        self.probe.read_system(self.is_elevated())
    }

    fn read_os_setting(&self, key: SettingKey) -> PlatformResult<SettingValue> {
        match key {
            SettingKey::SpotlightIndexing => {
                let output = command::run("mdutil", &["-s", "/"])?;
                Ok(SettingValue::text(parse_mdutil_status(&output)))
            }
            SettingKey::AppNap => {
                // an unset key reads as App Nap enabled
                match command::run("defaults", &["read", "NSGlobalDomain", "NSAppSleepDisabled"]) {
                    Ok(raw) => Ok(SettingValue::Number(raw.trim().parse().unwrap_or(0))),
                    Err(PlatformError::Os { .. }) => Ok(SettingValue::Number(0)),
                    Err(e) => Err(e),
                }
            }
            other => Err(PlatformError::unsupported(format!("setting {} on macOS", other))),
        }
    }

    fn write_os_setting(&self, key: SettingKey, value: &SettingValue) -> PlatformResult<()> {
        match key {
            SettingKey::SpotlightIndexing => {
                let flag = value.to_string();
                command::run("mdutil", &["-a", "-i", &flag])?;
            }
            SettingKey::AppNap => {
                let flag = if value.as_number().unwrap_or(0) != 0 {
                    "YES"
                } else {
                    "NO"
                };
                command::run(
                    "defaults",
                    &["write", "NSGlobalDomain", "NSAppSleepDisabled", "-bool", flag],
                )?;
            }
            other => {
                return Err(PlatformError::unsupported(format!(
                    "setting {} on macOS",
                    other
                )))
            }
        }
        log::info!("Set {} to {}", key, value);
        Ok(())
    }

    fn run_action(&self, action: OneShotAction) -> PlatformResult<String> {
        match action {
            OneShotAction::ClearMemoryCache => {
                command::run("purge", &[])?;
                Ok("Inactive memory purged".to_string())
            }
            OneShotAction::ClearDnsCache => {
                command::run("dscacheutil", &["-flushcache"])?;
                command::run("killall", &["-HUP", "mDNSResponder"])?;
                Ok("DNS cache flushed".to_string())
            }
        }
    }
}

/// `mdutil -s /` prints "Indexing enabled." or "Indexing disabled."
fn parse_mdutil_status(output: &str) -> &'static str {
    if output.to_lowercase().contains("indexing disabled") {
        "off"
    } else {
        "on"
    }
}
