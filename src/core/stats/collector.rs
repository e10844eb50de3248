use std::sync::Arc;
use std::time::Instant;

use humansize::{format_size, BINARY};
use parking_lot::Mutex;

use super::rates::RateTracker;
use super::sample::{ProgressEntry, StatCategory, StatSample};
use crate::error::Result;
use crate::platform::{Platform, SensorKind};

/// On-demand telemetry sampling.
///
/// Each category has its own lock around read-and-compute, so two polls of
/// the same category never interleave while different categories run in
/// parallel. Only storage and network keep state (their rate baselines).
pub struct StatsCollector {
    platform: Arc<dyn Platform>,
    cpu: Mutex<()>,
    memory: Mutex<()>,
    storage: Mutex<RateTracker>,
    network: Mutex<RateTracker>,
    gpu: Mutex<()>,
    system: Mutex<()>,
}

impl StatsCollector {
    pub fn new(platform: Arc<dyn Platform>) -> Self {
        Self {
            platform,
            cpu: Mutex::new(()),
            memory: Mutex::new(()),
            storage: Mutex::new(RateTracker::new()),
            network: Mutex::new(RateTracker::new()),
            gpu: Mutex::new(()),
            system: Mutex::new(()),
        }
    }

    pub fn sample(&self, category: StatCategory) -> Result<StatSample> {
        match category {
            StatCategory::Cpu => self.cpu(),
            StatCategory::Memory => self.memory(),
            StatCategory::Storage => self.storage(),
            StatCategory::Network => self.network(),
            StatCategory::Gpu => self.gpu(),
            StatCategory::System => self.system(),
        }
    }

    pub fn cpu(&self) -> Result<StatSample> {
        let _lock = self.cpu.lock();
        let reading = self.platform.read_cpu()?;

        let mut sample = StatSample::new(StatCategory::Cpu, reading.brand.clone())
            .with_percentage(reading.global_usage);

        for (index, usage) in reading.per_core_usage.iter().enumerate() {
            let temperature = reading.core_temperatures.get(index).copied().flatten();
            sample = sample.with_progress(
                ProgressEntry::new(format!("Core {}", index), *usage).with_temperature(temperature),
            );
        }

        let max_mhz = reading.frequencies_mhz.iter().copied().max().unwrap_or(0);
        let logical = reading.per_core_usage.len();
        let cores = match reading.physical_cores {
            Some(physical) => format!("{}/{}", physical, logical),
            None => logical.to_string(),
        };
        let temperature = self
            .platform
            .read_sensor(SensorKind::CpuTemperature)
            .map(|t| format!("{:.1}°C", t))
            .unwrap_or_else(|_| "N/A".to_string());
        let power = self
            .platform
            .read_sensor(SensorKind::CpuPackagePower)
            .map(|w| format!("{:.1} W", w))
            .unwrap_or_else(|_| "N/A".to_string());

        sample = sample
            .with_detail("Model", reading.brand)
            .with_detail("Frequency", format!("{:.2} GHz", max_mhz as f64 / 1000.0))
            .with_detail("Cores/Threads", cores)
            .with_detail("Temperature", temperature)
            .with_detail("Package Power", power);

        if let Some((one, five, fifteen)) = reading.load_average {
            sample = sample.with_detail("Load", format!("{:.2} {:.2} {:.2}", one, five, fifteen));
        }
        Ok(sample)
    }

    pub fn memory(&self) -> Result<StatSample> {
        let _lock = self.memory.lock();
        let reading = self.platform.read_memory()?;

        let ram = percent(reading.used_bytes, reading.total_bytes);
        let swap = percent(reading.swap_used_bytes, reading.swap_total_bytes);

        Ok(StatSample::new(StatCategory::Memory, "Memory")
            .with_percentage(ram)
            .with_progress(ProgressEntry::new("RAM", ram))
            .with_progress(ProgressEntry::new("Swap", swap))
            .with_detail("Total", format_size(reading.total_bytes, BINARY))
            .with_detail("Used", format_size(reading.used_bytes, BINARY))
            .with_detail("Available", format_size(reading.available_bytes, BINARY))
            .with_detail("Swap Total", format_size(reading.swap_total_bytes, BINARY))
            .with_detail("Swap Used", format_size(reading.swap_used_bytes, BINARY)))
    }

    /// Drives in the order the OS enumerates mounts
    pub fn storage(&self) -> Result<StatSample> {
        let mut rates = self.storage.lock();
        let disks = self.platform.read_disks()?;
        let now = Instant::now();

        let total: u64 = disks.iter().map(|d| d.total_bytes).sum();
        let free: u64 = disks.iter().map(|d| d.available_bytes).sum();
        let used = total.saturating_sub(free);

        let mut sample = StatSample::new(StatCategory::Storage, "Storage")
            .with_percentage(percent(used, total))
            .with_detail("Total", format_size(total, BINARY))
            .with_detail("Used", format_size(used, BINARY))
            .with_detail("Free", format_size(free, BINARY))
            .with_detail("Drives", disks.len().to_string());

        for disk in &disks {
            let disk_used = disk.total_bytes.saturating_sub(disk.available_bytes);
            let label = if disk.name.is_empty() || disk.name == disk.mount_point {
                disk.mount_point.clone()
            } else {
                format!("{} ({})", disk.mount_point, disk.name)
            };
            sample = sample.with_progress(ProgressEntry::new(
                label,
                percent(disk_used, disk.total_bytes),
            ));

            let (read, write) = match (disk.read_bytes_total, disk.written_bytes_total) {
                (Some(read), Some(written)) => {
                    let r = rates.observe(&disk.mount_point, &[read, written], now);
                    (format_rate(r[0]), format_rate(r[1]))
                }
                _ => ("N/A".to_string(), "N/A".to_string()),
            };
            sample = sample
                .with_detail(format!("{} Read", disk.mount_point), read)
                .with_detail(format!("{} Write", disk.mount_point), write);
        }

        rates.retain_only(disks.iter().map(|d| d.mount_point.as_str()));
        Ok(sample)
    }

    /// Interfaces sorted by name; each bar is the interface's share of the
    /// current combined throughput
    pub fn network(&self) -> Result<StatSample> {
        let mut rates = self.network.lock();
        let mut interfaces = self.platform.read_networks()?;
        interfaces.sort_by(|a, b| a.name.cmp(&b.name));
        let now = Instant::now();

        let measured: Vec<(f64, f64)> = interfaces
            .iter()
            .map(|iface| {
                let counters = [iface.rx_bytes_total, iface.tx_bytes_total];
                let r = rates.observe(&iface.name, &counters, now);
                (r[0], r[1])
            })
            .collect();
        rates.retain_only(interfaces.iter().map(|i| i.name.as_str()));

        let combined: f64 = measured.iter().map(|(rx, tx)| rx + tx).sum();
        let total_rx: f64 = measured.iter().map(|(rx, _)| rx).sum();
        let total_tx: f64 = measured.iter().map(|(_, tx)| tx).sum();
        let downloaded: u64 = interfaces.iter().map(|i| i.rx_bytes_total).sum();
        let uploaded: u64 = interfaces.iter().map(|i| i.tx_bytes_total).sum();

        let mut sample = StatSample::new(StatCategory::Network, "Network")
            .with_detail("Download Speed", format_rate(total_rx))
            .with_detail("Upload Speed", format_rate(total_tx))
            .with_detail("Total Downloaded", format_size(downloaded, BINARY))
            .with_detail("Total Uploaded", format_size(uploaded, BINARY))
            .with_detail("Interfaces", interfaces.len().to_string());

        for (iface, (rx, tx)) in interfaces.iter().zip(&measured) {
            let share = if combined > 0.0 {
                ((rx + tx) / combined * 100.0) as f32
            } else {
                0.0
            };
            sample = sample
                .with_progress(ProgressEntry::new(iface.name.clone(), share))
                .with_detail(format!("{} Download", iface.name), format_rate(*rx))
                .with_detail(format!("{} Upload", iface.name), format_rate(*tx));
        }
        Ok(sample)
    }

    /// GPUs in driver index order. Missing temperature/power stay absent
    /// in the bars and read "N/A" in the details.
    pub fn gpu(&self) -> Result<StatSample> {
        let _lock = self.gpu.lock();
        let mut gpus = self.platform.read_gpus()?;
        gpus.sort_by_key(|g| g.index);

        let title = match gpus.as_slice() {
            [only] => only.name.clone(),
            _ => "GPU".to_string(),
        };
        let mut sample = StatSample::new(StatCategory::Gpu, title);

        let utilizations: Vec<f32> = gpus.iter().filter_map(|g| g.utilization_percent).collect();
        if !utilizations.is_empty() {
            sample = sample
                .with_percentage(utilizations.iter().sum::<f32>() / utilizations.len() as f32);
        }

        if gpus.is_empty() {
            return Ok(sample.with_detail("GPUs", "none detected"));
        }
        sample = sample.with_detail("GPUs", gpus.len().to_string());

        for gpu in &gpus {
            let label = format!("GPU {}: {}", gpu.index, gpu.name);
            sample = sample.with_progress(
                ProgressEntry::new(label, gpu.utilization_percent.unwrap_or(0.0))
                    .with_temperature(gpu.temperature_celsius)
                    .with_power(gpu.power_watts),
            );

            let prefix = format!("GPU {}", gpu.index);
            let memory = match (gpu.memory_used_bytes, gpu.memory_total_bytes) {
                (Some(used), Some(total)) => format!(
                    "{} / {}",
                    format_size(used, BINARY),
                    format_size(total, BINARY)
                ),
                (None, Some(total)) => format_size(total, BINARY),
                _ => "N/A".to_string(),
            };
            sample = sample
                .with_detail(format!("{} Memory", prefix), memory)
                .with_detail(
                    format!("{} Temperature", prefix),
                    gpu.temperature_celsius
                        .map(|t| format!("{:.0}°C", t))
                        .unwrap_or_else(|| "N/A".to_string()),
                )
                .with_detail(
                    format!("{} Power", prefix),
                    gpu.power_watts
                        .map(|w| format!("{:.1} W", w))
                        .unwrap_or_else(|| "N/A".to_string()),
                )
                .with_detail(
                    format!("{} Fan", prefix),
                    gpu.fan_speed_percent
                        .map(|f| format!("{}%", f))
                        .unwrap_or_else(|| "N/A".to_string()),
                );
        }
        Ok(sample)
    }

    pub fn system(&self) -> Result<StatSample> {
        let _lock = self.system.lock();
        let reading = self.platform.read_system()?;

        Ok(StatSample::new(StatCategory::System, "System Info")
            .with_detail("OS", format!("{} {}", reading.os_name, reading.os_version))
            .with_detail("Kernel", reading.kernel_version)
            .with_detail("Hostname", reading.hostname)
            .with_detail("Uptime", format_uptime(reading.uptime_secs))
            .with_detail("CPU Cores", reading.logical_cores.to_string())
            .with_detail("Processes", reading.process_count.to_string())
            .with_detail("Elevated", if reading.elevated { "yes" } else { "no" }))
    }
}

fn percent(part: u64, whole: u64) -> f32 {
    if whole == 0 {
        0.0
    } else {
        (part as f64 / whole as f64 * 100.0) as f32
    }
}

fn format_rate(bytes_per_sec: f64) -> String {
    format!("{}/s", format_size(bytes_per_sec.max(0.0) as u64, BINARY))
}

fn format_uptime(secs: u64) -> String {
    let days = secs / 86_400;
    let hours = (secs % 86_400) / 3_600;
    let minutes = (secs % 3_600) / 60;

    if days > 0 {
        format!("{} days, {} hours", days, hours)
    } else if hours > 0 {
        format!("{} hours, {} minutes", hours, minutes)
    } else {
        format!("{} minutes", minutes)
    }
}
