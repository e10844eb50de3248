//! Windows platform: Win32 process control, registry-backed tuning knobs
//! and WMI as a GPU fallback when NVML sees nothing.

use std::collections::{BTreeSet, HashSet};
use std::io;
use std::ffi::c_void;
use std::mem;
use std::ptr;
use std::slice;

use serde::Deserialize;
use windows_sys::Win32::Foundation::{CloseHandle, HANDLE, INVALID_HANDLE_VALUE};
use windows_sys::Win32::System::Diagnostics::ToolHelp::{
    CreateToolhelp32Snapshot, Thread32First, Thread32Next, TH32CS_SNAPTHREAD, THREADENTRY32,
};
use windows_sys::Win32::System::ProcessStatus::{
    K32EmptyWorkingSet, K32GetProcessMemoryInfo, PROCESS_MEMORY_COUNTERS,
    PROCESS_MEMORY_COUNTERS_EX,
};
use windows_sys::Win32::System::SystemInformation::{
    GetLogicalProcessorInformationEx, RelationProcessorCore,
    SYSTEM_LOGICAL_PROCESSOR_INFORMATION_EX,
};
use windows_sys::Win32::System::Threading::{
    GetCurrentProcess, GetPriorityClass, GetProcessAffinityMask, GetProcessHandleCount,
    GetProcessIoCounters, OpenProcess, OpenThread, ResumeThread, SetPriorityClass,
    SetProcessAffinityMask, SuspendThread, TerminateProcess, ABOVE_NORMAL_PRIORITY_CLASS,
    BELOW_NORMAL_PRIORITY_CLASS, HIGH_PRIORITY_CLASS, IDLE_PRIORITY_CLASS, IO_COUNTERS,
    NORMAL_PRIORITY_CLASS, PROCESS_ACCESS_RIGHTS, PROCESS_QUERY_INFORMATION,
    PROCESS_QUERY_LIMITED_INFORMATION, PROCESS_SET_INFORMATION, PROCESS_SET_QUOTA,
    PROCESS_TERMINATE, PROCESS_VM_READ, REALTIME_PRIORITY_CLASS, THREAD_SUSPEND_RESUME,
};
use winreg::enums::{HKEY_CURRENT_USER, HKEY_LOCAL_MACHINE, KEY_READ};
use winreg::RegKey;
use wmi::WMIConnection;

use super::types::*;
use super::{command, elevation, gpu, Platform, PlatformError, PlatformResult, SysinfoProbe};

/// Owned process/thread handle, closed on drop
struct OwnedHandle(HANDLE);

impl OwnedHandle {
    fn open_process(pid: u32, access: PROCESS_ACCESS_RIGHTS, op: &str) -> PlatformResult<Self> {
        let handle = unsafe { OpenProcess(access, 0, pid) };
        if handle.is_null() {
            Err(win_error(pid, op))
        } else {
            Ok(Self(handle))
        }
    }
}

impl Drop for OwnedHandle {
    fn drop(&mut self) {
        unsafe {
            CloseHandle(self.0);
        }
    }
}

/// ERROR_INVALID_PARAMETER from OpenProcess means the pid is gone
fn win_error(pid: u32, op: &str) -> PlatformError {
    let err = io::Error::last_os_error();
    match err.raw_os_error() {
        Some(87) => PlatformError::ProcessNotFound(pid),
        _ => PlatformError::for_process(pid, op, err),
    }
}

#[derive(Clone, Copy)]
enum RegistryKind {
    Dword,
    Text,
}

struct RegistryKnob {
    machine_wide: bool,
    path: &'static str,
    name: &'static str,
    kind: RegistryKind,
}

fn registry_knob(key: SettingKey) -> Option<RegistryKnob> {
    let knob = |machine_wide, path, name, kind| RegistryKnob {
        machine_wide,
        path,
        name,
        kind,
    };
    Some(match key {
        SettingKey::GameDvr => knob(
            false,
            r"System\GameConfigStore",
            "GameDVR_Enabled",
            RegistryKind::Dword,
        ),
        SettingKey::FullscreenOptimizations => knob(
            false,
            r"System\GameConfigStore",
            "GameDVR_FSEBehaviorMode",
            RegistryKind::Dword,
        ),
        SettingKey::GameMode => knob(
            false,
            r"Software\Microsoft\GameBar",
            "AutoGameModeEnabled",
            RegistryKind::Dword,
        ),
        SettingKey::Transparency => knob(
            false,
            r"Software\Microsoft\Windows\CurrentVersion\Themes\Personalize",
            "EnableTransparency",
            RegistryKind::Dword,
        ),
        SettingKey::MinimizeAnimation => knob(
            false,
            r"Control Panel\Desktop\WindowMetrics",
            "MinAnimate",
            RegistryKind::Text,
        ),
        SettingKey::Telemetry => knob(
            true,
            r"SOFTWARE\Policies\Microsoft\Windows\DataCollection",
            "AllowTelemetry",
            RegistryKind::Dword,
        ),
        SettingKey::Cortana => knob(
            true,
            r"SOFTWARE\Policies\Microsoft\Windows\Windows Search",
            "AllowCortana",
            RegistryKind::Dword,
        ),
        _ => return None,
    })
}

fn registry_error(key: SettingKey, op: &str, err: io::Error) -> PlatformError {
    match err.kind() {
        io::ErrorKind::NotFound => PlatformError::SettingUnavailable(key.to_string()),
        _ => PlatformError::os(format!("{} {}", op, key), err),
    }
}

#[derive(Deserialize, Debug)]
#[serde(rename = "Win32_VideoController")]
#[serde(rename_all = "PascalCase")]
struct VideoController {
    name: Option<String>,
    #[serde(rename = "AdapterRAM")]
    adapter_ram: Option<u32>,
}

pub struct WindowsPlatform {
    probe: SysinfoProbe,
    collect_gpu: bool,
}

impl WindowsPlatform {
    pub fn new(collect_gpu: bool) -> Self {
        Self {
            probe: SysinfoProbe::new(),
            collect_gpu,
        }
    }

    pub fn hiding_kernel_threads(mut self, hide: bool) -> Self {
        self.probe = self.probe.hiding_kernel_threads(hide);
        self
    }

    fn thread_ids(pid: u32) -> PlatformResult<Vec<u32>> {
        let snapshot = unsafe { CreateToolhelp32Snapshot(TH32CS_SNAPTHREAD, 0) };
        if snapshot == INVALID_HANDLE_VALUE {
            return Err(PlatformError::os("snapshot threads", io::Error::last_os_error()));
        }
        let snapshot = OwnedHandle(snapshot);

        let mut entry: THREADENTRY32 = unsafe { mem::zeroed() };
        entry.dwSize = mem::size_of::<THREADENTRY32>() as u32;

        let mut threads = Vec::new();
        let mut more = unsafe { Thread32First(snapshot.0, &mut entry) } != 0;
        while more {
            if entry.th32OwnerProcessID == pid {
                threads.push(entry.th32ThreadID);
            }
            more = unsafe { Thread32Next(snapshot.0, &mut entry) } != 0;
        }

        if threads.is_empty() {
            return Err(PlatformError::ProcessNotFound(pid));
        }
        Ok(threads)
    }

    /// Suspend counts stack on Windows; each thread is held at exactly one
    /// so repeated suspends are idempotent and one resume undoes them.
    fn suspend_threads(pid: u32) -> PlatformResult<()> {
        for tid in Self::thread_ids(pid)? {
            let handle = unsafe { OpenThread(THREAD_SUSPEND_RESUME, 0, tid) };
            if handle.is_null() {
                // thread exited between snapshot and open
                continue;
            }
            let thread = OwnedHandle(handle);
            let previous = unsafe { SuspendThread(thread.0) };
            if previous == u32::MAX {
                return Err(win_error(pid, "suspend"));
            }
            if previous > 0 {
                unsafe { ResumeThread(thread.0) };
            }
        }
        Ok(())
    }

    fn resume_threads(pid: u32) -> PlatformResult<()> {
        for tid in Self::thread_ids(pid)? {
            let handle = unsafe { OpenThread(THREAD_SUSPEND_RESUME, 0, tid) };
            if handle.is_null() {
                continue;
            }
            let thread = OwnedHandle(handle);
            loop {
                let previous = unsafe { ResumeThread(thread.0) };
                if previous == u32::MAX {
                    return Err(win_error(pid, "resume"));
                }
                if previous <= 1 {
                    break;
                }
            }
        }
        Ok(())
    }

    fn enrich(&self, record: &mut ProcessRecord, suspended: &HashSet<u32>) {
        let handle = unsafe {
            OpenProcess(
                PROCESS_QUERY_LIMITED_INFORMATION | PROCESS_VM_READ,
                0,
                record.pid,
            )
        };
        if handle.is_null() {
            return;
        }
        let process = OwnedHandle(handle);

        unsafe {
            let mut handles = 0u32;
            if GetProcessHandleCount(process.0, &mut handles) != 0 {
                record.handle_count = handles;
            }

            let mut counters: PROCESS_MEMORY_COUNTERS_EX = mem::zeroed();
            counters.cb = mem::size_of::<PROCESS_MEMORY_COUNTERS_EX>() as u32;
            if K32GetProcessMemoryInfo(
                process.0,
                &mut counters as *mut _ as *mut PROCESS_MEMORY_COUNTERS,
                counters.cb,
            ) != 0
            {
                record.memory.private = counters.PrivateUsage as u64;
                record.memory.pagefile = counters.PagefileUsage as u64;
            }

            let mut io: IO_COUNTERS = mem::zeroed();
            if GetProcessIoCounters(process.0, &mut io) != 0 {
                record.io.read_ops = io.ReadOperationCount;
                record.io.write_ops = io.WriteOperationCount;
            }
        }

        if suspended.contains(&record.pid) {
            record.status = ProcessStatus::Suspended;
            record.is_suspended = true;
        }
    }

    fn wmi_gpus() -> Vec<GpuReading> {
        let connection = match WMIConnection::new() {
            Ok(c) => c,
            Err(e) => {
                log::debug!("WMI unavailable: {}", e);
                return Vec::new();
            }
        };
        let controllers: Vec<VideoController> = match connection.query() {
            Ok(rows) => rows,
            Err(e) => {
                log::debug!("Win32_VideoController query failed: {}", e);
                return Vec::new();
            }
        };

        controllers
            .into_iter()
            .enumerate()
            .map(|(index, controller)| {
                let name = controller.name.unwrap_or_else(|| "Unknown GPU".to_string());
                GpuReading {
                    index,
                    vendor: GpuVendor::from_name(&name),
                    name,
                    // AdapterRAM is a uint32 and saturates at 4 GiB
                    memory_total_bytes: controller.adapter_ram.map(u64::from),
                    ..GpuReading::default()
                }
            })
            .collect()
    }

    fn read_registry(key: SettingKey, knob: &RegistryKnob) -> PlatformResult<SettingValue> {
        let hive = if knob.machine_wide {
            RegKey::predef(HKEY_LOCAL_MACHINE)
        } else {
            RegKey::predef(HKEY_CURRENT_USER)
        };
        let reg = hive
            .open_subkey_with_flags(knob.path, KEY_READ)
            .map_err(|e| registry_error(key, "open", e))?;

        match knob.kind {
            RegistryKind::Dword => reg
                .get_value::<u32, _>(knob.name)
                .map(|v| SettingValue::Number(i64::from(v)))
                .map_err(|e| registry_error(key, "read", e)),
            RegistryKind::Text => reg
                .get_value::<String, _>(knob.name)
                .map(SettingValue::Text)
                .map_err(|e| registry_error(key, "read", e)),
        }
    }

    fn write_registry(
        key: SettingKey,
        knob: &RegistryKnob,
        value: &SettingValue,
    ) -> PlatformResult<()> {
        let hive = if knob.machine_wide {
            RegKey::predef(HKEY_LOCAL_MACHINE)
        } else {
            RegKey::predef(HKEY_CURRENT_USER)
        };
        let (reg, _) = hive
            .create_subkey(knob.path)
            .map_err(|e| registry_error(key, "open", e))?;

        match knob.kind {
            RegistryKind::Dword => {
                let number = value.as_number().ok_or_else(|| {
                    PlatformError::os(
                        format!("write {}", key),
                        io::Error::new(io::ErrorKind::InvalidInput, "expected a number"),
                    )
                })?;
                reg.set_value(knob.name, &(number as u32))
            }
            RegistryKind::Text => reg.set_value(knob.name, &value.to_string()),
        }
        .map_err(|e| registry_error(key, "write", e))
    }
}

impl Platform for WindowsPlatform {
    fn kind(&self) -> OsKind {
        OsKind::Windows
    }

    fn info(&self) -> PlatformInfo {
        PlatformInfo::detect(OsKind::Windows)
    }

    fn is_elevated(&self) -> bool {
        elevation::is_elevated()
    }

    fn core_count(&self) -> usize {
        self.probe.logical_cores()
    }

    /// Hybrid CPUs report a higher EfficiencyClass for performance cores
    fn performance_cores(&self) -> PlatformResult<Option<BTreeSet<usize>>> {
        let mut length = 0u32;
        unsafe {
            GetLogicalProcessorInformationEx(
                RelationProcessorCore,
                std::ptr::null_mut(),
                &mut length,
            );
        }
        if length == 0 {
            return Ok(None);
        }

        let mut buffer = vec![0u8; length as usize];
        let ok = unsafe {
            GetLogicalProcessorInformationEx(
                RelationProcessorCore,
                buffer.as_mut_ptr() as *mut SYSTEM_LOGICAL_PROCESSOR_INFORMATION_EX,
                &mut length,
            )
        };
        if ok == 0 {
            return Err(PlatformError::os("query processor topology", io::Error::last_os_error()));
        }

        // (efficiency class, logical processors of that core)
        let mut cores: Vec<(u8, Vec<usize>)> = Vec::new();
        let mut offset = 0usize;
        while offset < length as usize {
            let info = unsafe {
                &*(buffer.as_ptr().add(offset) as *const SYSTEM_LOGICAL_PROCESSOR_INFORMATION_EX)
            };
            let processor = unsafe { &info.Anonymous.Processor };
            let group = processor.GroupMask[0];
            // only group 0 is addressable through the process affinity mask
            if group.Group == 0 {
                let logical = (0..usize::BITS as usize)
                    .filter(|bit| group.Mask & (1usize << bit) != 0)
                    .collect();
                cores.push((processor.EfficiencyClass, logical));
            }
            if info.Size == 0 {
                break;
            }
            offset += info.Size as usize;
        }

        let Some(top_class) = cores.iter().map(|(class, _)| *class).max() else {
            return Ok(None);
        };
        if cores.iter().all(|(class, _)| *class == top_class) {
            return Ok(None);
        }

        Ok(Some(
            cores
                .into_iter()
                .filter(|(class, _)| *class == top_class)
                .flat_map(|(_, logical)| logical)
                .collect(),
        ))
    }

    fn list_processes(&self) -> PlatformResult<Vec<ProcessRecord>> {
        let mut records = self.probe.list_processes()?;
        let suspended = query_suspended_pids().unwrap_or_else(|e| {
            log::debug!("Thread states unavailable: {}", e);
            HashSet::new()
        });
        for record in &mut records {
            self.enrich(record, &suspended);
        }
        Ok(records)
    }

    fn get_priority(&self, pid: u32) -> PlatformResult<PriorityClass> {
        let process =
            OwnedHandle::open_process(pid, PROCESS_QUERY_LIMITED_INFORMATION, "read priority")?;
        let class = unsafe { GetPriorityClass(process.0) };
        Ok(match class {
            IDLE_PRIORITY_CLASS => PriorityClass::Idle,
            BELOW_NORMAL_PRIORITY_CLASS => PriorityClass::BelowNormal,
            ABOVE_NORMAL_PRIORITY_CLASS => PriorityClass::AboveNormal,
            HIGH_PRIORITY_CLASS => PriorityClass::High,
            REALTIME_PRIORITY_CLASS => PriorityClass::Realtime,
            0 => return Err(win_error(pid, "read priority")),
            _ => PriorityClass::Normal,
        })
    }

    fn set_priority(&self, pid: u32, class: PriorityClass) -> PlatformResult<()> {
        let process = OwnedHandle::open_process(pid, PROCESS_SET_INFORMATION, "set priority")?;
        let flag = match class {
            PriorityClass::Idle => IDLE_PRIORITY_CLASS,
            PriorityClass::BelowNormal => BELOW_NORMAL_PRIORITY_CLASS,
            PriorityClass::Normal => NORMAL_PRIORITY_CLASS,
            PriorityClass::AboveNormal => ABOVE_NORMAL_PRIORITY_CLASS,
            PriorityClass::High => HIGH_PRIORITY_CLASS,
            PriorityClass::Realtime => REALTIME_PRIORITY_CLASS,
        };
        if unsafe { SetPriorityClass(process.0, flag) } == 0 {
            return Err(win_error(pid, "set priority"));
        }
        Ok(())
    }

    fn get_affinity(&self, pid: u32) -> PlatformResult<BTreeSet<usize>> {
        let process =
            OwnedHandle::open_process(pid, PROCESS_QUERY_LIMITED_INFORMATION, "read affinity")?;
        let mut process_mask = 0usize;
        let mut system_mask = 0usize;
        if unsafe { GetProcessAffinityMask(process.0, &mut process_mask, &mut system_mask) } == 0 {
            return Err(win_error(pid, "read affinity"));
        }
        Ok((0..usize::BITS as usize)
            .filter(|bit| process_mask & (1usize << bit) != 0)
            .collect())
    }

    fn set_affinity(&self, pid: u32, cores: &BTreeSet<usize>) -> PlatformResult<()> {
        if cores.iter().any(|&core| core >= usize::BITS as usize) {
            return Err(PlatformError::unsupported(
                "affinity beyond the first processor group",
            ));
        }
        let mask = cores.iter().fold(0usize, |mask, &core| mask | (1usize << core));

        let process = OwnedHandle::open_process(
            pid,
            PROCESS_SET_INFORMATION | PROCESS_QUERY_INFORMATION,
            "set affinity",
        )?;
        if unsafe { SetProcessAffinityMask(process.0, mask) } == 0 {
            return Err(win_error(pid, "set affinity"));
        }
        Ok(())
    }

    fn suspend(&self, pid: u32) -> PlatformResult<()> {
        Self::suspend_threads(pid)
    }

    fn resume(&self, pid: u32) -> PlatformResult<()> {
        Self::resume_threads(pid)
    }

    fn terminate(&self, pid: u32) -> PlatformResult<()> {
        let process = OwnedHandle::open_process(pid, PROCESS_TERMINATE, "terminate")?;
        if unsafe { TerminateProcess(process.0, 1) } == 0 {
            return Err(win_error(pid, "terminate"));
        }
        Ok(())
    }

    fn read_sensor(&self, kind: SensorKind) -> PlatformResult<f64> {
        match kind {
            SensorKind::CpuTemperature => self
                .probe
                .cpu_temperature()
                .map(f64::from)
                .ok_or_else(|| PlatformError::unsupported("cpu temperature sensor")),
            SensorKind::CpuPackagePower => {
                Err(PlatformError::unsupported("cpu package power on Windows"))
            }
        }
    }

    fn read_cpu(&self) -> PlatformResult<CpuReading> {
        self.probe.read_cpu()
    }

    fn read_memory(&self) -> PlatformResult<MemoryReading> {
        self.probe.read_memory()
    }

    fn read_disks(&self) -> PlatformResult<Vec<DiskReading>> {
        self.probe.read_disks()
    }

    fn read_networks(&self) -> PlatformResult<Vec<InterfaceReading>> {
        self.probe.read_networks()
    }

    fn read_gpus(&self) -> PlatformResult<Vec<GpuReading>> {
        if !self.collect_gpu {
            return Ok(Vec::new());
        }
        let gpus = gpu::enumerate();
        if gpus.is_empty() {
            Ok(Self::wmi_gpus())
        } else {
            Ok(gpus)
        }
    }

    fn read_system(&self) -> PlatformResult<SystemReading> {
        self.probe.read_system(self.is_elevated())
    }

    fn read_os_setting(&self, key: SettingKey) -> PlatformResult<SettingValue> {
        if key == SettingKey::PowerScheme {
            let output = command::run("powercfg", &["/getactivescheme"])?;
            return parse_active_scheme(&output)
                .map(SettingValue::text)
                .ok_or_else(|| PlatformError::SettingUnavailable(key.to_string()));
        }

        let knob = registry_knob(key)
            .ok_or_else(|| PlatformError::unsupported(format!("setting {} on Windows", key)))?;
        Self::read_registry(key, &knob)
    }

    fn write_os_setting(&self, key: SettingKey, value: &SettingValue) -> PlatformResult<()> {
        if key == SettingKey::PowerScheme {
            command::run("powercfg", &["/setactive", &value.to_string()])?;
            log::info!("Activated power scheme {}", value);
            return Ok(());
        }

        let knob = registry_knob(key)
            .ok_or_else(|| PlatformError::unsupported(format!("setting {} on Windows", key)))?;
        Self::write_registry(key, &knob, value)?;
        log::info!("Set {} to {}", key, value);
        Ok(())
    }

    fn run_action(&self, action: OneShotAction) -> PlatformResult<String> {
        match action {
            OneShotAction::ClearMemoryCache => {
                let mut trimmed = 0usize;
                for record in self.probe.list_processes()? {
                    let handle = unsafe {
                        OpenProcess(
                            PROCESS_QUERY_LIMITED_INFORMATION | PROCESS_SET_QUOTA,
                            0,
                            record.pid,
                        )
                    };
                    if handle.is_null() {
                        continue;
                    }
                    let process = OwnedHandle(handle);
                    if unsafe { K32EmptyWorkingSet(process.0) } != 0 {
                        trimmed += 1;
                    }
                }
                // the engine's own working set too
                unsafe { K32EmptyWorkingSet(GetCurrentProcess()) };
                Ok(format!("Trimmed working sets of {} processes", trimmed))
            }
            OneShotAction::ClearDnsCache => {
                command::run("ipconfig", &["/flushdns"])?;
                Ok("DNS resolver cache flushed".to_string())
            }
        }
    }
}

/// Extract the GUID from `powercfg /getactivescheme` output
fn parse_active_scheme(output: &str) -> Option<String> {
    let after = output.split(':').nth(1)?;
    let guid = after.split_whitespace().next()?;
    (guid.len() == 36 && guid.chars().filter(|c| *c == '-').count() == 4)
        .then(|| guid.to_lowercase())
}

const SYSTEM_PROCESS_INFORMATION_CLASS: u32 = 5;
const STATUS_INFO_LENGTH_MISMATCH: i32 = 0xC000_0004_u32 as i32;
const THREAD_STATE_WAITING: u32 = 5;
const WAIT_REASON_SUSPENDED: u32 = 5;

#[link(name = "ntdll")]
extern "system" {
    fn NtQuerySystemInformation(
        class: u32,
        buffer: *mut c_void,
        length: u32,
        return_length: *mut u32,
    ) -> i32;
}

#[allow(dead_code)]
#[repr(C)]
#[derive(Clone, Copy)]
struct NtUnicodeString {
    length: u16,
    maximum_length: u16,
    buffer: *mut u16,
}

/// Fixed header of one `SystemProcessInformation` entry; its threads follow it
#[allow(dead_code)]
#[repr(C)]
#[derive(Clone, Copy)]
struct NtProcessEntry {
    next_entry_offset: u32,
    number_of_threads: u32,
    reserved: [i64; 6],
    image_name: NtUnicodeString,
    base_priority: i32,
    unique_process_id: usize,
    parent_process_id: usize,
    handle_count: u32,
    session_id: u32,
    process_key: usize,
    memory: [usize; 12],
    io: [i64; 6],
}

#[allow(dead_code)]
#[repr(C)]
#[derive(Clone, Copy)]
struct NtThreadEntry {
    times: [i64; 3],
    wait_time: u32,
    start_address: *mut c_void,
    client_id: [usize; 2],
    priority: i32,
    base_priority: i32,
    context_switches: u32,
    thread_state: u32,
    wait_reason: u32,
}

/// Pids whose every thread is waiting with the Suspended wait reason,
/// read from the kernel's process/thread table
fn query_suspended_pids() -> PlatformResult<HashSet<u32>> {
    let mut needed = 0u32;
    let status = unsafe {
        NtQuerySystemInformation(
            SYSTEM_PROCESS_INFORMATION_CLASS,
            ptr::null_mut(),
            0,
            &mut needed,
        )
    };
    if status != STATUS_INFO_LENGTH_MISMATCH {
        return Err(nt_error(status));
    }

    // the table grows between the two calls, so leave headroom and retry
    for _ in 0..3 {
        let bytes = needed as usize + 64 * 1024;
        let mut buffer = vec![0u64; bytes / mem::size_of::<u64>() + 1];
        let length = (buffer.len() * mem::size_of::<u64>()) as u32;

        let status = unsafe {
            NtQuerySystemInformation(
                SYSTEM_PROCESS_INFORMATION_CLASS,
                buffer.as_mut_ptr() as *mut c_void,
                length,
                &mut needed,
            )
        };
        if status == STATUS_INFO_LENGTH_MISMATCH {
            continue;
        }
        if status < 0 {
            return Err(nt_error(status));
        }

        let filled = (needed as usize).min(length as usize);
        let bytes = unsafe { slice::from_raw_parts(buffer.as_ptr() as *const u8, filled) };
        return Ok(suspended_pids(bytes));
    }
    Err(nt_error(STATUS_INFO_LENGTH_MISMATCH))
}

fn nt_error(status: i32) -> PlatformError {
    PlatformError::os(
        "query thread states",
        io::Error::other(format!("NTSTATUS {:#010x}", status as u32)),
    )
}

fn suspended_pids(table: &[u8]) -> HashSet<u32> {
    let process_size = mem::size_of::<NtProcessEntry>();
    let thread_size = mem::size_of::<NtThreadEntry>();
    let mut suspended = HashSet::new();
    let mut offset = 0usize;

    while offset + process_size <= table.len() {
        let process =
            unsafe { ptr::read_unaligned(table.as_ptr().add(offset) as *const NtProcessEntry) };
        let threads = offset + process_size;
        let count = process.number_of_threads as usize;

        let all_suspended = count > 0
            && threads + count * thread_size <= table.len()
            && (0..count).all(|i| {
                let thread = unsafe {
                    ptr::read_unaligned(
                        table.as_ptr().add(threads + i * thread_size) as *const NtThreadEntry
                    )
                };
                thread.thread_state == THREAD_STATE_WAITING
                    && thread.wait_reason == WAIT_REASON_SUSPENDED
            });
        if all_suspended {
            suspended.insert(process.unique_process_id as u32);
        }

        if process.next_entry_offset == 0 {
            break;
        }
        offset += process.next_entry_offset as usize;
    }
    suspended
}
