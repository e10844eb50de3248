// In-memory platform used by the integration tests

use std::collections::{BTreeSet, HashMap, HashSet};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Arc;

use parking_lot::Mutex;
use rigtune::core::{Engine, EngineConfig};
use rigtune::platform::{
    CpuReading, DiskReading, GpuReading, InterfaceReading, MemoryReading, OneShotAction, OsKind,
    Platform, PlatformError, PlatformInfo, PlatformResult, PriorityClass, ProcessRecord,
    ProcessStatus, SensorKind, SettingKey, SettingValue, SystemReading,
};

#[derive(Default)]
struct FakeState {
    processes: Vec<ProcessRecord>,
    affinity: HashMap<u32, BTreeSet<usize>>,
    priority: HashMap<u32, PriorityClass>,
    settings: HashMap<SettingKey, SettingValue>,
    elevated: bool,
    performance_cores: Option<BTreeSet<usize>>,
    failing: HashSet<&'static str>,
    disks: Vec<DiskReading>,
    interfaces: Vec<InterfaceReading>,
    gpus: Vec<GpuReading>,
    cpu_temperature: Option<f64>,
    mutations: usize,
    actions: Vec<OneShotAction>,
}

struct SuspendGate {
    entered: Sender<()>,
    release: Receiver<()>,
}

pub struct FakePlatform {
    kind: OsKind,
    cores: usize,
    state: Mutex<FakeState>,
    suspend_gate: Mutex<Option<SuspendGate>>,
}

pub fn process(pid: u32, name: &str, cpu: f32) -> ProcessRecord {
    let mut record = ProcessRecord::new(pid, name);
    record.cpu_usage_percent = cpu;
    record.memory.working_set = 64 * 1024 * 1024;
    record
}

pub fn child_of(pid: u32, parent: u32, name: &str) -> ProcessRecord {
    let mut record = process(pid, name, 0.0);
    record.parent_pid = Some(parent);
    record
}

pub fn cores(list: &[usize]) -> BTreeSet<usize> {
    list.iter().copied().collect()
}

impl FakePlatform {
    pub fn new(kind: OsKind, cores: usize) -> Self {
        Self {
            kind,
            cores,
            state: Mutex::new(FakeState::default()),
            suspend_gate: Mutex::new(None),
        }
    }

    pub fn with_process(self, record: ProcessRecord) -> Self {
        self.state.lock().processes.push(record);
        self
    }

    pub fn elevated(self, elevated: bool) -> Self {
        self.state.lock().elevated = elevated;
        self
    }

    pub fn with_setting(self, key: SettingKey, value: SettingValue) -> Self {
        self.state.lock().settings.insert(key, value);
        self
    }

    pub fn with_performance_cores(self, list: &[usize]) -> Self {
        self.state.lock().performance_cores = Some(cores(list));
        self
    }

    pub fn with_disk(self, disk: DiskReading) -> Self {
        self.state.lock().disks.push(disk);
        self
    }

    pub fn with_interface(self, name: &str) -> Self {
        self.state.lock().interfaces.push(InterfaceReading {
            name: name.to_string(),
            ..Default::default()
        });
        self
    }

    pub fn with_gpu(self, gpu: GpuReading) -> Self {
        self.state.lock().gpus.push(gpu);
        self
    }

    pub fn into_engine(self) -> (Arc<FakePlatform>, Engine) {
        let fake = Arc::new(self);
        let engine = Engine::with_platform(fake.clone(), EngineConfig::default());
        (fake, engine)
    }

    /// Make the telemetry read for `what` ("cpu", "memory", ...) fail
    pub fn fail(&self, what: &'static str) {
        self.state.lock().failing.insert(what);
    }

    pub fn recover(&self, what: &'static str) {
        self.state.lock().failing.remove(what);
    }

    pub fn add_traffic(&self, iface: &str, rx: u64, tx: u64) {
        let mut state = self.state.lock();
        if let Some(i) = state.interfaces.iter_mut().find(|i| i.name == iface) {
            i.rx_bytes_total += rx;
            i.tx_bytes_total += tx;
        }
    }

    pub fn add_disk_io(&self, mount_point: &str, read: u64, written: u64) {
        let mut state = self.state.lock();
        if let Some(d) = state.disks.iter_mut().find(|d| d.mount_point == mount_point) {
            d.read_bytes_total = Some(d.read_bytes_total.unwrap_or(0) + read);
            d.written_bytes_total = Some(d.written_bytes_total.unwrap_or(0) + written);
        }
    }

    pub fn mount(&self, disk: DiskReading) {
        self.state.lock().disks.push(disk);
    }

    pub fn unmount(&self, mount_point: &str) {
        self.state.lock().disks.retain(|d| d.mount_point != mount_point);
    }

    pub fn remove_gpu(&self, index: usize) {
        self.state.lock().gpus.retain(|g| g.index != index);
    }

    /// Change a setting behind the engine's back
    pub fn set_setting(&self, key: SettingKey, value: SettingValue) {
        self.state.lock().settings.insert(key, value);
    }

    pub fn setting(&self, key: SettingKey) -> Option<SettingValue> {
        self.state.lock().settings.get(&key).cloned()
    }

    pub fn affinity_of(&self, pid: u32) -> BTreeSet<usize> {
        self.state
            .lock()
            .affinity
            .get(&pid)
            .cloned()
            .unwrap_or_else(|| (0..self.cores).collect())
    }

    pub fn priority_of(&self, pid: u32) -> PriorityClass {
        self.state
            .lock()
            .priority
            .get(&pid)
            .copied()
            .unwrap_or(PriorityClass::Normal)
    }

    pub fn status_of(&self, pid: u32) -> Option<ProcessStatus> {
        self.state
            .lock()
            .processes
            .iter()
            .find(|p| p.pid == pid)
            .map(|p| p.status)
    }

    /// Number of state-changing calls that reached the platform
    pub fn mutations(&self) -> usize {
        self.state.lock().mutations
    }

    pub fn actions(&self) -> Vec<OneShotAction> {
        self.state.lock().actions.clone()
    }

    /// Block the next `suspend` until the returned sender fires. The
    /// returned receiver fires once the suspend call is in progress.
    pub fn gate_suspend(&self) -> (Receiver<()>, Sender<()>) {
        let (entered_tx, entered_rx) = mpsc::channel();
        let (release_tx, release_rx) = mpsc::channel();
        *self.suspend_gate.lock() = Some(SuspendGate {
            entered: entered_tx,
            release: release_rx,
        });
        (entered_rx, release_tx)
    }

    fn check_telemetry(&self, what: &'static str) -> PlatformResult<()> {
        if self.state.lock().failing.contains(what) {
            return Err(PlatformError::os(
                format!("read {}", what),
                std::io::Error::other("sensor offline"),
            ));
        }
        Ok(())
    }

    fn with_live_process<T>(
        &self,
        pid: u32,
        f: impl FnOnce(&mut FakeState, usize) -> T,
    ) -> PlatformResult<T> {
        let mut state = self.state.lock();
        let index = state
            .processes
            .iter()
            .position(|p| p.pid == pid)
            .ok_or(PlatformError::ProcessNotFound(pid))?;
        state.mutations += 1;
        Ok(f(&mut state, index))
    }
}

impl Platform for FakePlatform {
    fn kind(&self) -> OsKind {
        self.kind
    }

    fn info(&self) -> PlatformInfo {
        PlatformInfo {
            os: self.kind.to_string(),
            version: "test".to_string(),
            arch: "x86_64".to_string(),
        }
    }

    fn is_elevated(&self) -> bool {
        self.state.lock().elevated
    }

    fn core_count(&self) -> usize {
        self.cores
    }

    fn performance_cores(&self) -> PlatformResult<Option<BTreeSet<usize>>> {
        Ok(self.state.lock().performance_cores.clone())
    }

    fn list_processes(&self) -> PlatformResult<Vec<ProcessRecord>> {
        Ok(self.state.lock().processes.clone())
    }

    fn get_priority(&self, pid: u32) -> PlatformResult<PriorityClass> {
        Ok(self.priority_of(pid))
    }

    fn set_priority(&self, pid: u32, class: PriorityClass) -> PlatformResult<()> {
        let mut state = self.state.lock();
        let known = pid == std::process::id() || state.processes.iter().any(|p| p.pid == pid);
        if !known {
            return Err(PlatformError::ProcessNotFound(pid));
        }
        state.mutations += 1;
        state.priority.insert(pid, class);
        Ok(())
    }

    fn get_affinity(&self, pid: u32) -> PlatformResult<BTreeSet<usize>> {
        if !self.state.lock().processes.iter().any(|p| p.pid == pid) {
            return Err(PlatformError::ProcessNotFound(pid));
        }
        Ok(self.affinity_of(pid))
    }

    fn set_affinity(&self, pid: u32, cores: &BTreeSet<usize>) -> PlatformResult<()> {
        self.with_live_process(pid, |state, _| {
            state.affinity.insert(pid, cores.clone());
        })
    }

    fn suspend(&self, pid: u32) -> PlatformResult<()> {
        let gate = self.suspend_gate.lock().take();
        if let Some(gate) = gate {
            let _ = gate.entered.send(());
            let _ = gate.release.recv();
        }
        self.with_live_process(pid, |state, i| {
            state.processes[i].status = ProcessStatus::Suspended;
            state.processes[i].is_suspended = true;
        })
    }

    fn resume(&self, pid: u32) -> PlatformResult<()> {
        self.with_live_process(pid, |state, i| {
            state.processes[i].status = ProcessStatus::Running;
            state.processes[i].is_suspended = false;
        })
    }

    fn terminate(&self, pid: u32) -> PlatformResult<()> {
        self.with_live_process(pid, |state, i| {
            state.processes.remove(i);
        })
    }

    fn read_sensor(&self, kind: SensorKind) -> PlatformResult<f64> {
        match kind {
            SensorKind::CpuTemperature => self
                .state
                .lock()
                .cpu_temperature
                .ok_or_else(|| PlatformError::unsupported("cpu temperature")),
            SensorKind::CpuPackagePower => Err(PlatformError::unsupported("cpu package power")),
        }
    }

    fn read_cpu(&self) -> PlatformResult<CpuReading> {
        self.check_telemetry("cpu")?;
        Ok(CpuReading {
            brand: "Fake CPU".to_string(),
            global_usage: 25.0,
            per_core_usage: vec![25.0; self.cores],
            frequencies_mhz: vec![3600; self.cores],
            physical_cores: Some(self.cores / 2),
            core_temperatures: vec![None; self.cores],
            load_average: None,
        })
    }

    fn read_memory(&self) -> PlatformResult<MemoryReading> {
        self.check_telemetry("memory")?;
        Ok(MemoryReading {
            total_bytes: 16 << 30,
            used_bytes: 4 << 30,
            available_bytes: 12 << 30,
            swap_total_bytes: 0,
            swap_used_bytes: 0,
        })
    }

    fn read_disks(&self) -> PlatformResult<Vec<DiskReading>> {
        self.check_telemetry("storage")?;
        Ok(self.state.lock().disks.clone())
    }

    fn read_networks(&self) -> PlatformResult<Vec<InterfaceReading>> {
        self.check_telemetry("network")?;
        Ok(self.state.lock().interfaces.clone())
    }

    fn read_gpus(&self) -> PlatformResult<Vec<GpuReading>> {
        self.check_telemetry("gpu")?;
        Ok(self.state.lock().gpus.clone())
    }

    fn read_system(&self) -> PlatformResult<SystemReading> {
        self.check_telemetry("system")?;
        let state = self.state.lock();
        Ok(SystemReading {
            os_name: self.kind.to_string(),
            os_version: "test".to_string(),
            kernel_version: "0.0".to_string(),
            hostname: "rig".to_string(),
            uptime_secs: 3_600,
            process_count: state.processes.len(),
            logical_cores: self.cores,
            elevated: state.elevated,
        })
    }

    fn read_os_setting(&self, key: SettingKey) -> PlatformResult<SettingValue> {
        self.state
            .lock()
            .settings
            .get(&key)
            .cloned()
            .ok_or_else(|| PlatformError::SettingUnavailable(key.to_string()))
    }

    fn write_os_setting(&self, key: SettingKey, value: &SettingValue) -> PlatformResult<()> {
        let mut state = self.state.lock();
        state.mutations += 1;
        state.settings.insert(key, value.clone());
        Ok(())
    }

    fn run_action(&self, action: OneShotAction) -> PlatformResult<String> {
        let mut state = self.state.lock();
        state.mutations += 1;
        state.actions.push(action);
        Ok(String::new())
    }
}
