//! AMD GPU metrics from the amdgpu driver's sysfs files.

use std::fs;
use std::path::{Path, PathBuf};

use crate::platform::types::{GpuReading, GpuVendor};

const DRM_ROOT: &str = "/sys/class/drm";
const AMD_PCI_VENDOR: &str = "0x1002";

pub fn read_devices() -> Vec<GpuReading> {
    read_devices_under(Path::new(DRM_ROOT))
}

/// Walk `cardN` entries (skipping connector entries like `card0-DP-1`)
pub(crate) fn read_devices_under(drm_root: &Path) -> Vec<GpuReading> {
    let Ok(entries) = fs::read_dir(drm_root) else {
        return Vec::new();
    };

    let mut cards: Vec<PathBuf> = entries
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| {
            p.file_name()
                .and_then(|n| n.to_str())
                .map(|n| n.starts_with("card") && !n.contains('-'))
                .unwrap_or(false)
        })
        .collect();
    cards.sort();

    cards
        .iter()
        .map(|card| card.join("device"))
        .filter(|device| read_trimmed(&device.join("vendor")).as_deref() == Some(AMD_PCI_VENDOR))
        .enumerate()
        .map(|(index, device)| read_device(index, &device))
        .collect()
}

fn read_device(index: usize, device: &Path) -> GpuReading {
    let hwmon = first_hwmon(device);

    GpuReading {
        index,
        vendor: GpuVendor::Amd,
        name: read_trimmed(&device.join("product_name"))
            .unwrap_or_else(|| "AMD Radeon Graphics".to_string()),
        utilization_percent: read_number(&device.join("gpu_busy_percent")).map(|v| v as f32),
        memory_used_bytes: read_number(&device.join("mem_info_vram_used")),
        memory_total_bytes: read_number(&device.join("mem_info_vram_total")),
        // millidegrees
        temperature_celsius: hwmon
            .as_ref()
            .and_then(|h| read_number(&h.join("temp1_input")))
            .map(|v| v as f32 / 1000.0),
        // microwatts
        power_watts: hwmon
            .as_ref()
            .and_then(|h| {
                read_number(&h.join("power1_average"))
                    .or_else(|| read_number(&h.join("power1_input")))
            })
            .map(|v| v as f32 / 1_000_000.0),
        fan_speed_percent: hwmon.as_ref().and_then(|h| {
            let pwm = read_number(&h.join("pwm1"))?;
            let max = read_number(&h.join("pwm1_max")).unwrap_or(255);
            (max > 0).then(|| (pwm * 100 / max) as u32)
        }),
    }
}

fn first_hwmon(device: &Path) -> Option<PathBuf> {
    let mut entries: Vec<PathBuf> = fs::read_dir(device.join("hwmon"))
        .ok()?
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .collect();
    entries.sort();
    entries.into_iter().next()
}

fn read_trimmed(path: &Path) -> Option<String> {
    fs::read_to_string(path)
        .ok()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

fn read_number(path: &Path) -> Option<u64> {
    read_trimmed(path)?.parse().ok()
}
