use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::platform::PlatformError;

/// Error type returned by every engine operation
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    #[error("Unsupported on this platform: {0}")]
    Unsupported(String),

    #[error("Optimization '{id}' targets {scope}, not the current platform")]
    PlatformMismatch { id: String, scope: String },

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Optimization '{0}' cannot be reverted")]
    NotReversible(String),

    #[error("Process {0} has another operation in flight")]
    Busy(u32),

    #[error("IO error: {0}")]
    Io(String),
}

/// Serializable tag for an [`EngineError`], used in response payloads
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    NotFound,
    PermissionDenied,
    Unsupported,
    PlatformMismatch,
    InvalidArgument,
    NotReversible,
    Busy,
    Io,
}

/// Result type alias for engine operations
pub type Result<T> = std::result::Result<T, EngineError>;

impl EngineError {
    pub fn not_found<S: Into<String>>(msg: S) -> Self {
        EngineError::NotFound(msg.into())
    }

    pub fn permission_denied<S: Into<String>>(msg: S) -> Self {
        EngineError::PermissionDenied(msg.into())
    }

    pub fn unsupported<S: Into<String>>(msg: S) -> Self {
        EngineError::Unsupported(msg.into())
    }

    pub fn invalid_argument<S: Into<String>>(msg: S) -> Self {
        EngineError::InvalidArgument(msg.into())
    }

    pub fn io<S: Into<String>>(msg: S) -> Self {
        EngineError::Io(msg.into())
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            EngineError::NotFound(_) => ErrorKind::NotFound,
            EngineError::PermissionDenied(_) => ErrorKind::PermissionDenied,
            EngineError::Unsupported(_) => ErrorKind::Unsupported,
            EngineError::PlatformMismatch { .. } => ErrorKind::PlatformMismatch,
            EngineError::InvalidArgument(_) => ErrorKind::InvalidArgument,
            EngineError::NotReversible(_) => ErrorKind::NotReversible,
            EngineError::Busy(_) => ErrorKind::Busy,
            EngineError::Io(_) => ErrorKind::Io,
        }
    }
}

/// The one place raw platform failures are mapped onto the engine taxonomy.
///
/// OS error codes are dropped here; only the error kind survives.
impl From<PlatformError> for EngineError {
    fn from(err: PlatformError) -> Self {
        match err {
            PlatformError::ProcessNotFound(pid) => {
                EngineError::NotFound(format!("process {} does not exist", pid))
            }
            PlatformError::PermissionDenied(msg) => EngineError::PermissionDenied(msg),
            PlatformError::Unsupported(what) => EngineError::Unsupported(what),
            PlatformError::SettingUnavailable(key) => {
                EngineError::NotFound(format!("setting {} is not present on this system", key))
            }
            PlatformError::Os { op, source } => {
                EngineError::Io(format!("{} failed: {}", op, source.kind()))
            }
        }
    }
}
