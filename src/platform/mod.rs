//! Platform abstraction layer.
//!
//! Every OS-specific call the engine makes goes through the [`Platform`] trait.
//! One implementation is picked at startup by [`current`]; business logic in
//! `core` never branches on the target OS.

mod command;
pub mod elevation;
pub mod fs;
pub mod gpu;
mod probe;
mod types;

#[cfg(unix)]
mod unix;

#[cfg(target_os = "linux")]
mod linux;
#[cfg(target_os = "macos")]
mod macos;
mod unsupported;
#[cfg(windows)]
mod windows;

use std::collections::BTreeSet;
use std::io;
use std::path::Path;
use std::sync::Arc;

use thiserror::Error;

pub use elevation::is_elevated;
pub use probe::SysinfoProbe;
pub use types::*;
pub use unsupported::UnsupportedPlatform;

/// Raw failure reported by a platform implementation.
///
/// These never leave the engine: `core` converts them into
/// [`crate::error::EngineError`].
#[derive(Error, Debug)]
pub enum PlatformError {
    #[error("process {0} not found")]
    ProcessNotFound(u32),

    #[error("permission denied: {0}")]
    PermissionDenied(String),

    #[error("unsupported: {0}")]
    Unsupported(String),

    #[error("setting {0} unavailable")]
    SettingUnavailable(String),

    #[error("{op}: {source}")]
    Os {
        op: String,
        #[source]
        source: io::Error,
    },
}

pub type PlatformResult<T> = std::result::Result<T, PlatformError>;

impl PlatformError {
    pub fn unsupported<S: Into<String>>(what: S) -> Self {
        PlatformError::Unsupported(what.into())
    }

    /// Classify an I/O error raised while operating on `pid`
    pub fn for_process(pid: u32, op: &str, source: io::Error) -> Self {
        match source.kind() {
            io::ErrorKind::NotFound => PlatformError::ProcessNotFound(pid),
            io::ErrorKind::PermissionDenied => {
                PlatformError::PermissionDenied(format!("{} on process {}", op, pid))
            }
            _ => PlatformError::Os {
                op: format!("{} on process {}", op, pid),
                source,
            },
        }
    }

    /// Classify an I/O error raised by a non-process call (settings, sensors)
    pub fn os(op: impl Into<String>, source: io::Error) -> Self {
        let op = op.into();
        match source.kind() {
            io::ErrorKind::PermissionDenied => PlatformError::PermissionDenied(op),
            _ => PlatformError::Os { op, source },
        }
    }
}

/// Capability set the engine needs from the host OS.
///
/// Defaults fail with [`PlatformError::Unsupported`]; each variant overrides the
/// operations its OS can actually perform. Nothing here caches desired state:
/// every read goes back to the OS.
pub trait Platform: Send + Sync {
    fn kind(&self) -> OsKind;

    fn info(&self) -> PlatformInfo;

    fn is_elevated(&self) -> bool {
        false
    }

    /// Number of logical cores the scheduler can use
    fn core_count(&self) -> usize;

    /// Logical cores belonging to the performance cluster, when the CPU
    /// exposes a performance/efficiency split. `None` when no split exists.
    fn performance_cores(&self) -> PlatformResult<Option<BTreeSet<usize>>> {
        Ok(None)
    }

    fn list_processes(&self) -> PlatformResult<Vec<ProcessRecord>> {
        Err(PlatformError::unsupported("process enumeration"))
    }

    fn read_process(&self, pid: u32) -> PlatformResult<ProcessRecord> {
        self.list_processes()?
            .into_iter()
            .find(|p| p.pid == pid)
            .ok_or(PlatformError::ProcessNotFound(pid))
    }

    fn get_priority(&self, _pid: u32) -> PlatformResult<PriorityClass> {
        Err(PlatformError::unsupported("process priority"))
    }

    fn set_priority(&self, _pid: u32, _class: PriorityClass) -> PlatformResult<()> {
        Err(PlatformError::unsupported("process priority"))
    }

    fn get_affinity(&self, _pid: u32) -> PlatformResult<BTreeSet<usize>> {
        Err(PlatformError::unsupported("cpu affinity"))
    }

    fn set_affinity(&self, _pid: u32, _cores: &BTreeSet<usize>) -> PlatformResult<()> {
        Err(PlatformError::unsupported("cpu affinity"))
    }

    fn suspend(&self, _pid: u32) -> PlatformResult<()> {
        Err(PlatformError::unsupported("process suspension"))
    }

    fn resume(&self, _pid: u32) -> PlatformResult<()> {
        Err(PlatformError::unsupported("process suspension"))
    }

    fn terminate(&self, _pid: u32) -> PlatformResult<()> {
        Err(PlatformError::unsupported("process termination"))
    }

    fn read_sensor(&self, kind: SensorKind) -> PlatformResult<f64> {
        Err(PlatformError::unsupported(format!("sensor {}", kind)))
    }

    fn read_cpu(&self) -> PlatformResult<CpuReading> {
        Err(PlatformError::unsupported("cpu telemetry"))
    }

    fn read_memory(&self) -> PlatformResult<MemoryReading> {
        Err(PlatformError::unsupported("memory telemetry"))
    }

    fn read_disks(&self) -> PlatformResult<Vec<DiskReading>> {
        Err(PlatformError::unsupported("storage telemetry"))
    }

    fn read_networks(&self) -> PlatformResult<Vec<InterfaceReading>> {
        Err(PlatformError::unsupported("network telemetry"))
    }

    fn read_gpus(&self) -> PlatformResult<Vec<GpuReading>> {
        Err(PlatformError::unsupported("gpu telemetry"))
    }

    fn read_system(&self) -> PlatformResult<SystemReading> {
        Err(PlatformError::unsupported("system telemetry"))
    }

    fn read_os_setting(&self, key: SettingKey) -> PlatformResult<SettingValue> {
        Err(PlatformError::unsupported(format!("setting {}", key)))
    }

    fn write_os_setting(&self, key: SettingKey, _value: &SettingValue) -> PlatformResult<()> {
        Err(PlatformError::unsupported(format!("setting {}", key)))
    }

    /// Run a one-shot maintenance action, returning a human-readable outcome
    fn run_action(&self, action: OneShotAction) -> PlatformResult<String> {
        Err(PlatformError::unsupported(format!("action {}", action)))
    }

    /// Reveal `path` in the OS file manager
    fn open_location(&self, path: &Path) -> PlatformResult<()> {
        fs::reveal_in_file_manager(path)
    }
}

/// Select the implementation for the OS this binary was built for
pub fn current(collect_gpu: bool, hide_kernel_threads: bool) -> Arc<dyn Platform> {
    #[cfg(target_os = "linux")]
    {
        Arc::new(linux::LinuxPlatform::new(collect_gpu).hiding_kernel_threads(hide_kernel_threads))
    }
    #[cfg(windows)]
    {
        Arc::new(
            windows::WindowsPlatform::new(collect_gpu).hiding_kernel_threads(hide_kernel_threads),
        )
    }
    #[cfg(target_os = "macos")]
    {
        Arc::new(macos::MacPlatform::new(collect_gpu).hiding_kernel_threads(hide_kernel_threads))
    }
    #[cfg(not(any(target_os = "linux", target_os = "macos", windows)))]
    {
        let _ = (collect_gpu, hide_kernel_threads);
        Arc::new(UnsupportedPlatform::new())
    }
}
