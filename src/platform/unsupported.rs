use super::types::{OsKind, PlatformInfo};
use super::Platform;

/// Fallback for targets without a dedicated implementation.
///
/// Everything beyond identification reports `Unsupported`, which the engine
/// surfaces as an error instead of guessing.
#[derive(Debug, Default)]
pub struct UnsupportedPlatform;

impl UnsupportedPlatform {
    pub fn new() -> Self {
        Self
    }
}

impl Platform for UnsupportedPlatform {
    fn kind(&self) -> OsKind {
        OsKind::Other
    }

    fn info(&self) -> PlatformInfo {
        PlatformInfo::detect(OsKind::Other)
    }

    fn core_count(&self) -> usize {
        std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1)
    }
}
