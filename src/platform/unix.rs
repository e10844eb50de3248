//! Signal and nice-value helpers shared by the Linux and macOS platforms.

use std::io;

use super::types::PriorityClass;
use super::{PlatformError, PlatformResult};

/// Map the current `errno` onto the platform taxonomy for a call on `pid`
pub(crate) fn last_process_error(pid: u32, op: &str) -> PlatformError {
    classify_errno(pid, op, io::Error::last_os_error())
}

pub(crate) fn classify_errno(pid: u32, op: &str, err: io::Error) -> PlatformError {
    match err.raw_os_error() {
        Some(libc::ESRCH) => PlatformError::ProcessNotFound(pid),
        Some(libc::EPERM) | Some(libc::EACCES) => {
            PlatformError::PermissionDenied(format!("{} on process {}", op, pid))
        }
        _ => PlatformError::for_process(pid, op, err),
    }
}

/// To the kernel pid 0 means "the caller", never another process
pub(crate) fn target_pid(pid: u32) -> PlatformResult<libc::pid_t> {
    if pid == 0 || pid > i32::MAX as u32 {
        return Err(PlatformError::ProcessNotFound(pid));
    }
    Ok(pid as libc::pid_t)
}

pub(crate) fn send_signal(pid: u32, signal: libc::c_int, op: &str) -> PlatformResult<()> {
    let target = target_pid(pid)?;
    let rc = unsafe { libc::kill(target, signal) };
    if rc == 0 {
        Ok(())
    } else {
        Err(last_process_error(pid, op))
    }
}

pub(crate) fn suspend(pid: u32) -> PlatformResult<()> {
    send_signal(pid, libc::SIGSTOP, "suspend")
}

pub(crate) fn resume(pid: u32) -> PlatformResult<()> {
    send_signal(pid, libc::SIGCONT, "resume")
}

pub(crate) fn terminate(pid: u32) -> PlatformResult<()> {
    send_signal(pid, libc::SIGKILL, "terminate")
}

#[cfg(target_os = "linux")]
fn clear_errno() {
    unsafe { *libc::__errno_location() = 0 }
}

#[cfg(target_os = "macos")]
fn clear_errno() {
    unsafe { *libc::__error() = 0 }
}

#[cfg(not(any(target_os = "linux", target_os = "macos")))]
fn clear_errno() {}

/// `getpriority` can legitimately return -1, so errno decides success
pub(crate) fn get_priority(pid: u32) -> PlatformResult<PriorityClass> {
    let target = target_pid(pid)?;
    clear_errno();
    let nice = unsafe { libc::getpriority(libc::PRIO_PROCESS, target as libc::id_t) };
    if nice == -1 {
        let err = io::Error::last_os_error();
        if err.raw_os_error().unwrap_or(0) != 0 {
            return Err(classify_errno(pid, "read priority", err));
        }
    }
    Ok(PriorityClass::from_nice(nice))
}

pub(crate) fn set_priority(pid: u32, class: PriorityClass) -> PlatformResult<()> {
    let target = target_pid(pid)?;
    let rc = unsafe { libc::setpriority(libc::PRIO_PROCESS, target as libc::id_t, class.nice()) };
    if rc == 0 {
        Ok(())
    } else {
        Err(last_process_error(pid, "set priority"))
    }
}
