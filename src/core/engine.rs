//! The engine facade: one instance of every component, one method per
//! operation a front-end can invoke.

use std::collections::BTreeSet;
use std::path::Path;
use std::sync::Arc;

use crate::core::config::EngineConfig;
use crate::core::health::{HealthMonitor, HealthSnapshot};
use crate::core::optimization::{OptimizationGroup, OptimizationRegistry};
use crate::core::process::{
    AffinityOutcome, BoostReport, CpuAffinityInfo, ProcessFilter, ProcessPage, ProcessRegistry,
    ProcessSnapshot,
};
use crate::core::response::ActionResponse;
use crate::core::stats::{StatCategory, StatSample, StatsCollector};
use crate::error::Result;
use crate::platform::{self, Platform, PlatformInfo};

pub struct Engine {
    platform: Arc<dyn Platform>,
    config: EngineConfig,
    processes: ProcessRegistry,
    stats: StatsCollector,
    optimizations: OptimizationRegistry,
    health: HealthMonitor,
}

impl Engine {
    /// Engine bound to the OS this binary runs on
    pub fn new(config: EngineConfig) -> Self {
        let platform = platform::current(config.collect_gpu, config.hide_kernel_threads);
        Self::with_platform(platform, config)
    }

    pub fn with_platform(platform: Arc<dyn Platform>, config: EngineConfig) -> Self {
        log::debug!("Engine starting on {}", platform.kind());
        Self {
            processes: ProcessRegistry::new(Arc::clone(&platform)),
            stats: StatsCollector::new(Arc::clone(&platform)),
            optimizations: OptimizationRegistry::new(Arc::clone(&platform)),
            health: HealthMonitor::new(),
            platform,
            config,
        }
    }

    /// Swap in a custom optimization registry, e.g. one built over a
    /// reduced catalog
    pub fn with_optimizations(mut self, optimizations: OptimizationRegistry) -> Self {
        self.optimizations = optimizations;
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn processes(&self) -> &ProcessRegistry {
        &self.processes
    }

    // Processes

    pub fn list_processes(&self, filter: &ProcessFilter) -> Result<ProcessPage> {
        self.processes.list(filter, self.config.default_per_page)
    }

    pub fn process_detail(&self, pid: u32) -> Result<ProcessSnapshot> {
        self.processes.detail(pid)
    }

    pub fn kill_process(&self, pid: u32) -> ActionResponse {
        ActionResponse::from_result(self.processes.kill(pid), |_| {
            format!("Process {} terminated", pid)
        })
    }

    pub fn suspend_process(&self, pid: u32) -> ActionResponse {
        ActionResponse::from_result(self.processes.suspend(pid), |_| {
            format!("Process {} suspended", pid)
        })
    }

    pub fn resume_process(&self, pid: u32) -> ActionResponse {
        ActionResponse::from_result(self.processes.resume(pid), |_| {
            format!("Process {} resumed", pid)
        })
    }

    pub fn get_process_affinity(&self, pid: u32) -> Result<CpuAffinityInfo> {
        self.processes.get_affinity(pid)
    }

    pub fn set_process_affinity(&self, pid: u32, cores: &BTreeSet<usize>) -> ActionResponse {
        ActionResponse::from_result(self.processes.set_affinity(pid, cores), |_| {
            format!("Process {} restricted to cores {}", pid, join_cores(cores))
        })
    }

    pub fn get_cpu_core_count(&self) -> usize {
        self.processes.core_count()
    }

    pub fn boost_process_for_gaming(&self, pid: u32) -> ActionResponse {
        ActionResponse::from_result(self.processes.boost_for_gaming(pid), |report| {
            describe_boost(&report)
        })
    }

    // Optimizations

    pub fn get_available_optimizations(&self) -> Vec<OptimizationGroup> {
        self.optimizations.list_available()
    }

    pub fn apply_optimization(&self, id: &str) -> ActionResponse {
        let result = self.optimizations.apply(id);
        let needs_restart = result.as_ref().map(|o| o.needs_restart).unwrap_or(false);
        ActionResponse::from_result(result, |outcome| outcome.message).with_restart(needs_restart)
    }

    pub fn revert_optimization(&self, id: &str) -> ActionResponse {
        let result = self.optimizations.revert(id);
        let needs_restart = result.as_ref().map(|o| o.needs_restart).unwrap_or(false);
        ActionResponse::from_result(result, |outcome| outcome.message).with_restart(needs_restart)
    }

    // Platform

    pub fn get_current_platform(&self) -> PlatformInfo {
        self.platform.info()
    }

    pub fn open_file_location(&self, path: &Path) -> ActionResponse {
        let result: Result<()> = self.platform.open_location(path).map_err(Into::into);
        ActionResponse::from_result(result, |_| format!("Opened {}", path.display()))
    }

    // Telemetry

    /// Sample one category through the health monitor. Never fails: a
    /// broken sensor yields the last good sample or a placeholder.
    pub fn get_stats(&self, category: StatCategory) -> StatSample {
        self.health.sample(category, || self.stats.sample(category))
    }

    pub fn get_cpu_stats(&self) -> StatSample {
        self.get_stats(StatCategory::Cpu)
    }

    pub fn get_memory_stats(&self) -> StatSample {
        self.get_stats(StatCategory::Memory)
    }

    pub fn get_storage_stats(&self) -> StatSample {
        self.get_stats(StatCategory::Storage)
    }

    pub fn get_network_stats(&self) -> StatSample {
        self.get_stats(StatCategory::Network)
    }

    pub fn get_gpu_stats(&self) -> StatSample {
        self.get_stats(StatCategory::Gpu)
    }

    pub fn get_system_stats(&self) -> StatSample {
        self.get_stats(StatCategory::System)
    }

    pub fn get_monitor_health(&self) -> HealthSnapshot {
        self.health.snapshot()
    }

    pub fn reset_monitor_health(&self) -> ActionResponse {
        self.health.reset();
        ActionResponse::ok("Monitor health counters reset")
    }
}

fn join_cores(cores: &BTreeSet<usize>) -> String {
    cores
        .iter()
        .map(|c| c.to_string())
        .collect::<Vec<_>>()
        .join(",")
}

fn describe_boost(report: &BoostReport) -> String {
    let affinity = match &report.affinity {
        AffinityOutcome::Restricted { cores } => {
            format!("pinned to performance cores {}", join_cores(cores))
        }
        AffinityOutcome::Skipped { reason } => format!("affinity unchanged ({})", reason),
        AffinityOutcome::Failed { message } => format!("affinity change failed: {}", message),
    };
    format!("Process {} raised to high priority; {}", report.pid, affinity)
}
