//! Linux platform: signals and nice values through libc, affinity through
//! `sched_setaffinity`, tuning through procfs and sysfs.

use std::collections::BTreeSet;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::thread;
use std::time::{Duration, Instant};

use super::types::*;
use super::{command, elevation, gpu, unix, Platform, PlatformError, PlatformResult, SysinfoProbe};

pub struct LinuxPlatform {
    probe: SysinfoProbe,
    collect_gpu: bool,
    proc_root: PathBuf,
    sys_root: PathBuf,
}

impl LinuxPlatform {
    pub fn new(collect_gpu: bool) -> Self {
        Self::with_roots(collect_gpu, PathBuf::from("/proc"), PathBuf::from("/sys"))
    }

    /// Point procfs/sysfs lookups somewhere else (used by tests)
    pub fn with_roots(collect_gpu: bool, proc_root: PathBuf, sys_root: PathBuf) -> Self {
        Self {
            probe: SysinfoProbe::new(),
            collect_gpu,
            proc_root,
            sys_root,
        }
    }

    pub fn hiding_kernel_threads(mut self, hide: bool) -> Self {
        self.probe = self.probe.hiding_kernel_threads(hide);
        self
    }

    fn governor_files(&self) -> Vec<PathBuf> {
        let cpu_dir = self.sys_root.join("devices/system/cpu");
        let Ok(entries) = fs::read_dir(&cpu_dir) else {
            return Vec::new();
        };

        let mut files: Vec<PathBuf> = entries
            .filter_map(|e| e.ok())
            .filter(|e| {
                let name = e.file_name();
                let name = name.to_string_lossy();
                name.strip_prefix("cpu")
                    .map(|rest| !rest.is_empty() && rest.chars().all(|c| c.is_ascii_digit()))
                    .unwrap_or(false)
            })
            .map(|e| e.path().join("cpufreq/scaling_governor"))
            .filter(|p| p.exists())
            .collect();
        files.sort();
        files
    }

    fn setting_path(&self, key: SettingKey) -> PlatformResult<PathBuf> {
        match key {
            SettingKey::Swappiness => Ok(self.proc_root.join("sys/vm/swappiness")),
            SettingKey::SchedAutogroup => {
                Ok(self.proc_root.join("sys/kernel/sched_autogroup_enabled"))
            }
            SettingKey::CpuGovernor => self
                .governor_files()
                .into_iter()
                .next()
                .ok_or_else(|| PlatformError::SettingUnavailable(key.to_string())),
            other => Err(PlatformError::unsupported(format!("setting {} on Linux", other))),
        }
    }

    fn enrich(&self, record: &mut ProcessRecord) {
        let pid_dir = self.proc_root.join(record.pid.to_string());

        if let Ok(status) = fs::read_to_string(pid_dir.join("status")) {
            let fields = parse_status(&status);
            record.memory.private = fields.rss_anon_bytes;
            record.memory.pagefile = fields.swap_bytes;
        }
        if let Ok(io) = fs::read_to_string(pid_dir.join("io")) {
            let (reads, writes) = parse_io_ops(&io);
            record.io.read_ops = reads;
            record.io.write_ops = writes;
        }
        if let Ok(fds) = fs::read_dir(pid_dir.join("fd")) {
            record.handle_count = fds.count() as u32;
        }
    }

    fn package_power_watts(&self) -> PlatformResult<f64> {
        let energy = self
            .sys_root
            .join("class/powercap/intel-rapl:0/energy_uj");
        let read = |path: &Path| -> PlatformResult<u64> {
            let text = fs::read_to_string(path).map_err(|e| match e.kind() {
                io::ErrorKind::NotFound => PlatformError::unsupported("cpu package power"),
                _ => PlatformError::os("read RAPL energy counter", e),
            })?;
            text.trim()
                .parse()
                .map_err(|_| PlatformError::unsupported("cpu package power"))
        };

        let start = Instant::now();
        let first = read(&energy)?;
        thread::sleep(Duration::from_millis(100));
        let second = read(&energy)?;
        let elapsed = start.elapsed().as_secs_f64();

        if second < first || elapsed <= 0.0 {
            // counter wrapped; report nothing rather than a bogus spike
            return Err(PlatformError::unsupported("cpu package power"));
        }
        Ok((second - first) as f64 / 1_000_000.0 / elapsed)
    }
}

impl Platform for LinuxPlatform {
    fn kind(&self) -> OsKind {
        OsKind::Linux
    }

    fn info(&self) -> PlatformInfo {
        PlatformInfo::detect(OsKind::Linux)
    }

    fn is_elevated(&self) -> bool {
        elevation::is_elevated()
    }

    fn core_count(&self) -> usize {
        self.probe.logical_cores()
    }

    /// Intel hybrid parts expose the P-core list under the `cpu_core` PMU
    fn performance_cores(&self) -> PlatformResult<Option<BTreeSet<usize>>> {
        let path = self.sys_root.join("devices/cpu_core/cpus");
        match fs::read_to_string(&path) {
            Ok(list) => Ok(parse_cpu_list(&list).filter(|set| !set.is_empty())),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(PlatformError::os("read performance core list", e)),
        }
    }

    fn list_processes(&self) -> PlatformResult<Vec<ProcessRecord>> {
        let mut records = self.probe.list_processes()?;
        for record in &mut records {
            self.enrich(record);
        }
        Ok(records)
    }

    fn get_priority(&self, pid: u32) -> PlatformResult<PriorityClass> {
        unix::get_priority(pid)
    }

    fn set_priority(&self, pid: u32, class: PriorityClass) -> PlatformResult<()> {
        unix::set_priority(pid, class)
    }

    fn get_affinity(&self, pid: u32) -> PlatformResult<BTreeSet<usize>> {
        let target = unix::target_pid(pid)?;
        let cores = self.core_count();
        unsafe {
            let mut set: libc::cpu_set_t = std::mem::zeroed();
            let rc = libc::sched_getaffinity(
                target,
                std::mem::size_of::<libc::cpu_set_t>(),
                &mut set,
            );
            if rc != 0 {
                return Err(unix::last_process_error(pid, "read affinity"));
            }
            Ok((0..cores).filter(|&cpu| libc::CPU_ISSET(cpu, &set)).collect())
        }
    }

    /// Linux affinity is per thread, so the mask is applied to every task
    /// of the process. Threads that exit mid-walk are skipped.
    fn set_affinity(&self, pid: u32, cores: &BTreeSet<usize>) -> PlatformResult<()> {
        unix::target_pid(pid)?;
        let mut set: libc::cpu_set_t = unsafe { std::mem::zeroed() };
        unsafe {
            libc::CPU_ZERO(&mut set);
            for &cpu in cores {
                libc::CPU_SET(cpu, &mut set);
            }
        }

        let apply = |tid: u32| -> PlatformResult<()> {
            let target = unix::target_pid(tid)?;
            let rc = unsafe {
                libc::sched_setaffinity(
                    target,
                    std::mem::size_of::<libc::cpu_set_t>(),
                    &set,
                )
            };
            if rc == 0 {
                Ok(())
            } else {
                Err(unix::last_process_error(tid, "set affinity"))
            }
        };

        // the main thread first: its failure is the process's failure
        apply(pid)?;

        let tasks = self.proc_root.join(pid.to_string()).join("task");
        let Ok(entries) = fs::read_dir(&tasks) else {
            return Ok(());
        };
        for tid in entries
            .filter_map(|e| e.ok())
            .filter_map(|e| e.file_name().to_str().and_then(|n| n.parse::<u32>().ok()))
            .filter(|&tid| tid != pid)
        {
            match apply(tid) {
                Ok(()) | Err(PlatformError::ProcessNotFound(_)) => {}
                Err(e) => return Err(e),
            }
        }
        Ok(())
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
            SensorKind::CpuPackagePower => self.package_power_watts(),
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
        let path = self.setting_path(key)?;
        let raw = fs::read_to_string(&path).map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => PlatformError::SettingUnavailable(key.to_string()),
            _ => PlatformError::os(format!("read {}", key), e),
        })?;

        let raw = raw.trim();
        Ok(match raw.parse::<i64>() {
            Ok(n) => SettingValue::Number(n),
            Err(_) => SettingValue::text(raw),
        })
    }

    fn write_os_setting(&self, key: SettingKey, value: &SettingValue) -> PlatformResult<()> {
        let targets = match key {
            SettingKey::CpuGovernor => {
                let files = self.governor_files();
                if files.is_empty() {
                    return Err(PlatformError::SettingUnavailable(key.to_string()));
                }
                files
            }
            _ => vec![self.setting_path(key)?],
        };

        // (path, value before this write) for every file already changed
        let mut written: Vec<(PathBuf, String)> = Vec::with_capacity(targets.len());
        for path in targets {
            match write_knob(&path, key, value) {
                Ok(previous) => written.push((path, previous)),
                Err(e) => {
                    roll_back(&written);
                    return Err(e);
                }
            }
        }
        log::info!("Set {} to {}", key, value);
        Ok(())
    }

    fn run_action(&self, action: OneShotAction) -> PlatformResult<String> {
        match action {
            OneShotAction::ClearMemoryCache => {
                unsafe { libc::sync() };
                fs::write(self.proc_root.join("sys/vm/drop_caches"), "3")
                    .map_err(|e| PlatformError::os("drop page cache", e))?;
                Ok("Page cache, dentries and inodes dropped".to_string())
            }
            OneShotAction::ClearDnsCache => {
                command::run("resolvectl", &["flush-caches"])?;
                Ok("systemd-resolved cache flushed".to_string())
            }
        }
    }
}

/// Write `value` to one procfs/sysfs knob, returning what it held before
fn write_knob(path: &Path, key: SettingKey, value: &SettingValue) -> PlatformResult<String> {
    let previous = fs::read_to_string(path).map_err(|e| match e.kind() {
        io::ErrorKind::NotFound => PlatformError::SettingUnavailable(key.to_string()),
        _ => PlatformError::os(format!("read {} at {}", key, path.display()), e),
    })?;
    fs::write(path, value.to_string())
        .map_err(|e| PlatformError::os(format!("write {} at {}", key, path.display()), e))?;
    Ok(previous.trim().to_string())
}

/// Restore knobs in reverse order after a partial multi-file write
fn roll_back(written: &[(PathBuf, String)]) {
    for (path, previous) in written.iter().rev() {
        match fs::write(path, previous) {
            Ok(()) => log::debug!("Restored {} to {}", path.display(), previous),
            Err(e) => log::warn!("Could not restore {} to {}: {}", path.display(), previous, e),
        }
    }
}

#[derive(Debug, Default, PartialEq)]
struct StatusFields {
    rss_anon_bytes: u64,
    swap_bytes: u64,
}

/// Pull the memory lines we care about out of `/proc/<pid>/status`
fn parse_status(text: &str) -> StatusFields {
    let kib = |line: &str| -> u64 {
        line.split_whitespace()
            .nth(1)
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(0)
            * 1024
    };

    let mut fields = StatusFields::default();
    for line in text.lines() {
        if line.starts_with("RssAnon:") {
            fields.rss_anon_bytes = kib(line);
        } else if line.starts_with("VmSwap:") {
            fields.swap_bytes = kib(line);
        }
    }
    fields
}

fn parse_io_ops(text: &str) -> (u64, u64) {
    let mut reads = 0;
    let mut writes = 0;
    for line in text.lines() {
        if let Some(v) = line.strip_prefix("syscr:") {
            reads = v.trim().parse().unwrap_or(0);
        } else if let Some(v) = line.strip_prefix("syscw:") {
            writes = v.trim().parse().unwrap_or(0);
        }
    }
    (reads, writes)
}

/// Parse kernel cpu lists like `0-7,16,18-19`
fn parse_cpu_list(text: &str) -> Option<BTreeSet<usize>> {
    let mut set = BTreeSet::new();
    for part in text.trim().split(',').filter(|p| !p.is_empty()) {
        match part.split_once('-') {
            Some((lo, hi)) => {
                let lo: usize = lo.trim().parse().ok()?;
                let hi: usize = hi.trim().parse().ok()?;
                set.extend(lo..=hi);
            }
            None => {
                set.insert(part.trim().parse().ok()?);
            }
        }
    }
    Some(set)
}
