// File manager integration

use std::io;
use std::path::Path;
use std::process::Command;

use super::{PlatformError, PlatformResult};

/// Open the OS file manager with `path` selected (or its folder opened
/// where the file manager cannot select a single entry).
pub fn reveal_in_file_manager(path: &Path) -> PlatformResult<()> {
    if !path.exists() {
        return Err(PlatformError::os(
            format!("reveal {}", path.display()),
            io::Error::new(io::ErrorKind::NotFound, "path does not exist"),
        ));
    }

    let mut command = reveal_command(path);
    log::debug!("Revealing {} with {:?}", path.display(), command);

    // explorer.exe exits with 1 even when it succeeds, so only a spawn failure counts
    command
        .spawn()
        .map(|_| ())
        .map_err(|e| PlatformError::os(format!("launch file manager for {}", path.display()), e))
}

#[cfg(windows)]
fn reveal_command(path: &Path) -> Command {
    let mut command = Command::new("explorer");
    command.arg(format!("/select,{}", path.display()));
    command
}

#[cfg(target_os = "macos")]
fn reveal_command(path: &Path) -> Command {
    let mut command = Command::new("open");
    command.arg("-R").arg(path);
    command
}

#[cfg(not(any(windows, target_os = "macos")))]
fn reveal_command(path: &Path) -> Command {
    let target = if path.is_dir() {
        path
    } else {
        path.parent().unwrap_or(path)
    };
    let mut command = Command::new("xdg-open");
    command.arg(target);
    command
}
