//! sysinfo-backed probing shared by every platform variant.
//!
//! Each resource keeps its own lock so that, for example, a slow process
//! enumeration never stalls a CPU sample.

use std::time::Instant;

use parking_lot::Mutex;
use sysinfo::{
    Components, CpuRefreshKind, Disks, MemoryRefreshKind, Networks, ProcessRefreshKind,
    ProcessesToUpdate, RefreshKind, System, ThreadKind, UpdateKind,
};

use super::types::*;
use super::PlatformResult;

struct CpuState {
    system: System,
    last_refresh: Option<Instant>,
}

pub struct SysinfoProbe {
    cpu: Mutex<CpuState>,
    memory: Mutex<System>,
    processes: Mutex<System>,
    disks: Mutex<Disks>,
    networks: Mutex<Networks>,
    components: Mutex<Components>,
    hide_kernel_threads: bool,
}

impl SysinfoProbe {
    pub fn new() -> Self {
        let cpu_system = System::new_with_specifics(
            RefreshKind::nothing().with_cpu(CpuRefreshKind::everything()),
        );
        let memory_system = System::new_with_specifics(
            RefreshKind::nothing().with_memory(MemoryRefreshKind::everything()),
        );

        let mut process_system = System::new();
        process_system.refresh_processes_specifics(
            ProcessesToUpdate::All,
            true,
            Self::process_refresh_kind(),
        );

        Self {
            cpu: Mutex::new(CpuState {
                system: cpu_system,
                last_refresh: None,
            }),
            memory: Mutex::new(memory_system),
            processes: Mutex::new(process_system),
            disks: Mutex::new(Disks::new_with_refreshed_list()),
            networks: Mutex::new(Networks::new_with_refreshed_list()),
            components: Mutex::new(Components::new_with_refreshed_list()),
            hide_kernel_threads: false,
        }
    }

    pub fn hiding_kernel_threads(mut self, hide: bool) -> Self {
        self.hide_kernel_threads = hide;
        self
    }

    fn process_refresh_kind() -> ProcessRefreshKind {
        ProcessRefreshKind::nothing()
            .with_cpu()
            .with_memory()
            .with_disk_usage()
            .with_tasks()
            .with_exe(UpdateKind::OnlyIfNotSet)
    }

    pub fn logical_cores(&self) -> usize {
        let cores = self.cpu.lock().system.cpus().len();
        if cores == 0 {
            std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1)
        } else {
            cores
        }
    }

    /// Snapshot every process visible to this user.
    ///
    /// sysinfo reports per-core percentages (up to 100 x cores); the record
    /// carries the share of the whole machine instead.
    pub fn list_processes(&self) -> PlatformResult<Vec<ProcessRecord>> {
        let cores = self.logical_cores().max(1) as f32;
        let mut system = self.processes.lock();
        system.refresh_processes_specifics(
            ProcessesToUpdate::All,
            true,
            Self::process_refresh_kind(),
        );

        let mut records: Vec<ProcessRecord> = system
            .processes()
            .values()
            .filter(|proc| match proc.thread_kind() {
                Some(ThreadKind::Userland) => false,
                Some(ThreadKind::Kernel) => !self.hide_kernel_threads,
                None => true,
            })
            .map(|proc| {
                let status = match proc.status() {
                    sysinfo::ProcessStatus::Run => ProcessStatus::Running,
                    sysinfo::ProcessStatus::Stop | sysinfo::ProcessStatus::Tracing => {
                        ProcessStatus::Suspended
                    }
                    sysinfo::ProcessStatus::Zombie | sysinfo::ProcessStatus::Dead => {
                        ProcessStatus::Stopped
                    }
                    _ => ProcessStatus::Sleeping,
                };
                let disk = proc.disk_usage();

                ProcessRecord {
                    pid: proc.pid().as_u32(),
                    parent_pid: proc.parent().map(|p| p.as_u32()),
                    name: proc.name().to_string_lossy().to_string(),
                    exe_path: proc
                        .exe()
                        .map(|p| p.to_string_lossy().to_string())
                        .unwrap_or_default(),
                    status,
                    cpu_usage_percent: (proc.cpu_usage() / cores).clamp(0.0, 100.0),
                    memory: MemoryUsage {
                        working_set: proc.memory(),
                        private: 0,
                        virtual_bytes: proc.virtual_memory(),
                        pagefile: 0,
                    },
                    handle_count: 0,
                    thread_count: proc.tasks().map(|t| t.len() as u32).unwrap_or(1),
                    is_suspended: status == ProcessStatus::Suspended,
                    session_id: proc.session_id().map(|p| p.as_u32()).unwrap_or(0),
                    io: IoCounters {
                        read_bytes: disk.total_read_bytes,
                        write_bytes: disk.total_written_bytes,
                        read_ops: 0,
                        write_ops: 0,
                    },
                    run_time_secs: proc.run_time(),
                }
            })
            .collect();

        records.sort_by_key(|r| r.pid);
        Ok(records)
    }

    pub fn process_count(&self) -> usize {
        self.processes.lock().processes().len()
    }

    pub fn read_cpu(&self) -> PlatformResult<CpuReading> {
        let mut state = self.cpu.lock();
        state.system.refresh_cpu_all();

        // Usage is a delta between two refreshes; the very first one needs a partner
        let needs_second_sample = state
            .last_refresh
            .map(|t| t.elapsed() < sysinfo::MINIMUM_CPU_UPDATE_INTERVAL)
            .unwrap_or(true);
        if needs_second_sample {
            std::thread::sleep(sysinfo::MINIMUM_CPU_UPDATE_INTERVAL);
            state.system.refresh_cpu_all();
        }
        state.last_refresh = Some(Instant::now());

        let cpus = state.system.cpus();
        let core_temperatures = self.core_temperatures(cpus.len());
        let load = System::load_average();
        let load_average = if cfg!(windows) {
            None
        } else {
            Some((load.one, load.five, load.fifteen))
        };

        Ok(CpuReading {
            brand: cpus
                .first()
                .map(|c| c.brand().trim().to_string())
                .unwrap_or_else(|| "Unknown CPU".to_string()),
            global_usage: state.system.global_cpu_usage(),
            per_core_usage: cpus.iter().map(|cpu| cpu.cpu_usage()).collect(),
            frequencies_mhz: cpus.iter().map(|cpu| cpu.frequency()).collect(),
            physical_cores: System::physical_core_count(),
            core_temperatures,
            load_average,
        })
    }

    /// Map "Core N" style sensor labels onto logical core slots
    fn core_temperatures(&self, logical_cores: usize) -> Vec<Option<f32>> {
        let mut temps = vec![None; logical_cores];
        let mut components = self.components.lock();
        components.refresh(true);

        for comp in components.iter() {
            let Some(index) = parse_core_index(comp.label()) else {
                continue;
            };
            if let (Some(slot), Some(temp)) = (temps.get_mut(index), comp.temperature()) {
                *slot = Some(temp);
            }
        }
        temps
    }

    /// Average over every sensor that looks like a CPU package/core sensor
    pub fn cpu_temperature(&self) -> Option<f32> {
        let mut components = self.components.lock();
        components.refresh(true);

        let readings: Vec<f32> = components
            .iter()
            .filter(|comp| {
                let label = comp.label().to_lowercase();
                label.contains("cpu")
                    || label.contains("core")
                    || label.contains("package")
                    || label.contains("tctl")
                    || label.contains("tdie")
            })
            .filter_map(|comp| comp.temperature())
            .filter(|t| t.is_finite() && *t > 0.0)
            .collect();

        if readings.is_empty() {
            None
        } else {
            Some(readings.iter().sum::<f32>() / readings.len() as f32)
        }
    }

    pub fn read_memory(&self) -> PlatformResult<MemoryReading> {
        let mut system = self.memory.lock();
        system.refresh_memory();

        Ok(MemoryReading {
            total_bytes: system.total_memory(),
            used_bytes: system.used_memory(),
            available_bytes: system.available_memory(),
            swap_total_bytes: system.total_swap(),
            swap_used_bytes: system.used_swap(),
        })
    }

    pub fn read_disks(&self) -> PlatformResult<Vec<DiskReading>> {
        let mut disks = self.disks.lock();
        disks.refresh(true);

        Ok(disks
            .iter()
            .map(|disk| {
                let usage = disk.usage();
                DiskReading {
                    name: disk.name().to_string_lossy().to_string(),
                    mount_point: disk.mount_point().to_string_lossy().to_string(),
                    fs_type: disk.file_system().to_string_lossy().to_string(),
                    total_bytes: disk.total_space(),
                    available_bytes: disk.available_space(),
                    read_bytes_total: Some(usage.total_read_bytes),
                    written_bytes_total: Some(usage.total_written_bytes),
                }
            })
            .collect())
    }

    /// Interfaces sorted by name; sysinfo keeps them in a hash map
    pub fn read_networks(&self) -> PlatformResult<Vec<InterfaceReading>> {
        let mut networks = self.networks.lock();
        networks.refresh(true);

        let mut interfaces: Vec<InterfaceReading> = networks
            .iter()
            .map(|(name, data)| InterfaceReading {
                name: name.to_string(),
                mac_address: data.mac_address().to_string(),
                rx_bytes_total: data.total_received(),
                tx_bytes_total: data.total_transmitted(),
                rx_packets_total: data.total_packets_received(),
                tx_packets_total: data.total_packets_transmitted(),
            })
            .collect();

        interfaces.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(interfaces)
    }

    pub fn read_system(&self, elevated: bool) -> PlatformResult<SystemReading> {
        Ok(SystemReading {
            os_name: System::name().unwrap_or_else(|| "Unknown".to_string()),
            os_version: System::os_version().unwrap_or_else(|| "Unknown".to_string()),
            kernel_version: System::kernel_version().unwrap_or_else(|| "Unknown".to_string()),
            hostname: System::host_name().unwrap_or_else(|| "Unknown".to_string()),
            uptime_secs: System::uptime(),
            process_count: self.process_count(),
            logical_cores: self.logical_cores(),
            elevated,
        })
    }
}

impl Default for SysinfoProbe {
    fn default() -> Self {
        Self::new()
    }
}

fn parse_core_index(label: &str) -> Option<usize> {
    let lower = label.to_lowercase();
    let idx = lower.find("core ")?;
    lower[idx + 5..]
        .split(|c: char| !c.is_ascii_digit())
        .next()
        .and_then(|digits| digits.parse().ok())
}
