use std::io;
use std::process::Command;

use super::{PlatformError, PlatformResult};

/// Run an OS utility and return its trimmed stdout.
///
/// A non-zero exit becomes an error carrying the tool's stderr; permission
/// complaints are classified so admin gating surfaces correctly.
pub(crate) fn run(program: &str, args: &[&str]) -> PlatformResult<String> {
    log::debug!("Running {} {}", program, args.join(" "));

    let mut command = Command::new(program);
    command.args(args);
    #[cfg(windows)]
    {
        use std::os::windows::process::CommandExt;
        command.creation_flags(0x08000000); // CREATE_NO_WINDOW
    }

    let output = command.output().map_err(|e| {
        if e.kind() == io::ErrorKind::NotFound {
            PlatformError::unsupported(format!("{} is not installed", program))
        } else {
            PlatformError::os(format!("run {}", program), e)
        }
    })?;

    if output.status.success() {
        return Ok(String::from_utf8_lossy(&output.stdout).trim().to_string());
    }

    let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
    let lower = stderr.to_lowercase();
    if lower.contains("permission denied")
        || lower.contains("operation not permitted")
        || lower.contains("access is denied")
        || lower.contains("must be run as root")
    {
        return Err(PlatformError::PermissionDenied(format!("{}: {}", program, stderr)));
    }

    Err(PlatformError::Os {
        op: format!("run {}", program),
        source: io::Error::other(if stderr.is_empty() {
            format!("exited with {}", output.status)
        } else {
            stderr
        }),
    })
}
