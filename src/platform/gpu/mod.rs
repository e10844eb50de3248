//! GPU telemetry.
//!
//! NVIDIA devices are read through NVML; AMD devices on Linux through the
//! amdgpu sysfs interface. Platforms with their own fallback (WMI on Windows)
//! layer it on top of [`enumerate`].

#[cfg(target_os = "linux")]
mod amd;
mod nvidia;

use super::types::GpuReading;

/// Every GPU the vendor libraries can see, indexed in discovery order
pub fn enumerate() -> Vec<GpuReading> {
    #[allow(unused_mut)]
    let mut gpus = nvidia::read_devices();

    #[cfg(target_os = "linux")]
    gpus.extend(amd::read_devices());

    for (index, gpu) in gpus.iter_mut().enumerate() {
        gpu.index = index;
    }
    gpus
}
