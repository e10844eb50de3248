use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::platform::{IoCounters, MemoryUsage, ProcessRecord, ProcessStatus};

/// Point-in-time view of one process, built fresh for every query
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessSnapshot {
    pub pid: u32,
    pub parent_pid: Option<u32>,
    /// The parent pid is set but no such process exists in the same listing
    pub orphaned: bool,
    pub name: String,
    pub executable_path: String,
    pub status: ProcessStatus,
    pub cpu_usage_percent: f32,
    pub memory: MemoryUsage,
    pub handle_count: u32,
    pub thread_count: u32,
    pub is_suspended: bool,
    pub session_id: u32,
    pub io: IoCounters,
    pub run_time_secs: u64,
    /// The OS reports an affinity narrower than the whole machine
    pub affinity_set: bool,
    /// Direct children, ascending by pid; only filled in by `detail`
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<ChildSummary>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChildSummary {
    pub pid: u32,
    pub name: String,
    pub cpu_usage_percent: f32,
    pub memory_bytes: u64,
    pub is_suspended: bool,
}

impl ProcessSnapshot {
    pub fn from_record(record: &ProcessRecord, orphaned: bool) -> Self {
        Self {
            pid: record.pid,
            parent_pid: record.parent_pid,
            orphaned,
            name: record.name.clone(),
            executable_path: record.exe_path.clone(),
            status: record.status,
            cpu_usage_percent: record.cpu_usage_percent,
            memory: record.memory,
            handle_count: record.handle_count,
            thread_count: record.thread_count,
            is_suspended: record.is_suspended || record.status == ProcessStatus::Suspended,
            session_id: record.session_id,
            io: record.io,
            run_time_secs: record.run_time_secs,
            affinity_set: false,
            children: Vec::new(),
        }
    }
}

impl From<&ProcessRecord> for ChildSummary {
    fn from(record: &ProcessRecord) -> Self {
        Self {
            pid: record.pid,
            name: record.name.clone(),
            cpu_usage_percent: record.cpu_usage_percent,
            memory_bytes: record.memory.working_set,
            is_suspended: record.is_suspended || record.status == ProcessStatus::Suspended,
        }
    }
}

/// Core count and the mask the OS currently reports for a process
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CpuAffinityInfo {
    pub core_count: usize,
    pub current_mask: BTreeSet<usize>,
}

impl CpuAffinityInfo {
    /// True when the process may run on fewer cores than the machine has
    pub fn is_restricted(&self) -> bool {
        !self.current_mask.is_empty()
            && self.current_mask.len() < self.core_count
            && self.current_mask.iter().all(|&core| core < self.core_count)
    }
}

/// Outcome of the affinity half of a gaming boost
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum AffinityOutcome {
    /// Affinity narrowed to these performance cores
    Restricted { cores: BTreeSet<usize> },
    /// Affinity left alone; the reason says why
    Skipped { reason: String },
    /// The OS rejected the affinity change; priority stays raised
    Failed { message: String },
}

/// Which sub-steps of a gaming boost took effect
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoostReport {
    pub pid: u32,
    pub priority_raised: bool,
    pub affinity: AffinityOutcome,
}
