use crate::platform::types::{GpuReading, GpuVendor};

#[cfg(feature = "nvml")]
use nvml_wrapper::{enum_wrappers::device::TemperatureSensor, Nvml};
#[cfg(feature = "nvml")]
use once_cell::sync::Lazy;

/// NVML must be initialized once per process
#[cfg(feature = "nvml")]
static NVML: Lazy<Option<Nvml>> = Lazy::new(|| match Nvml::init() {
    Ok(nvml) => Some(nvml),
    Err(e) => {
        log::debug!("NVML unavailable: {}", e);
        None
    }
});

/// Read every NVIDIA device NVML can see.
///
/// Individual metrics that fail (fan on a passively cooled card, power on
/// some laptop parts) are reported as absent rather than failing the device.
#[cfg(feature = "nvml")]
pub fn read_devices() -> Vec<GpuReading> {
    let Some(nvml) = NVML.as_ref() else {
        return Vec::new();
    };

    let count = nvml.device_count().unwrap_or(0);
    let mut readings = Vec::with_capacity(count as usize);

    for index in 0..count {
        let device = match nvml.device_by_index(index) {
            Ok(device) => device,
            Err(e) => {
                log::warn!("Skipping NVIDIA device {}: {}", index, e);
                continue;
            }
        };
        let memory = device.memory_info().ok();

        readings.push(GpuReading {
            index: index as usize,
            vendor: GpuVendor::Nvidia,
            name: device
                .name()
                .unwrap_or_else(|_| "Unknown NVIDIA GPU".to_string()),
            utilization_percent: device.utilization_rates().ok().map(|u| u.gpu as f32),
            memory_used_bytes: memory.as_ref().map(|m| m.used),
            memory_total_bytes: memory.as_ref().map(|m| m.total),
            temperature_celsius: device
                .temperature(TemperatureSensor::Gpu)
                .ok()
                .map(|t| t as f32),
            // milliwatts -> watts
            power_watts: device.power_usage().ok().map(|mw| mw as f32 / 1000.0),
            fan_speed_percent: device.fan_speed(0).ok(),
        });
    }

    readings
}

#[cfg(not(feature = "nvml"))]
pub fn read_devices() -> Vec<GpuReading> {
    Vec::new()
}
