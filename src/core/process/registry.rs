use std::collections::{BTreeSet, HashSet};
use std::sync::Arc;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use super::filter::{self, ProcessFilter};
use super::snapshot::{
    AffinityOutcome, BoostReport, ChildSummary, CpuAffinityInfo, ProcessSnapshot,
};
use super::tree::ProcessIndex;
use crate::error::{EngineError, Result};
use crate::platform::{Platform, PlatformError, PriorityClass};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessPage {
    pub processes: Vec<ProcessSnapshot>,
    pub total_count: usize,
}

/// Process listing and mutation on top of a [`Platform`].
///
/// At most one mutation per pid is in flight; a second concurrent
/// mutation of the same pid fails fast with [`EngineError::Busy`].
pub struct ProcessRegistry {
    platform: Arc<dyn Platform>,
    in_flight: Mutex<HashSet<u32>>,
}

/// Holds a pid's mutation slot until dropped
pub struct PidGuard<'a> {
    pid: u32,
    in_flight: &'a Mutex<HashSet<u32>>,
}

impl Drop for PidGuard<'_> {
    fn drop(&mut self) {
        self.in_flight.lock().remove(&self.pid);
    }
}

impl ProcessRegistry {
    pub fn new(platform: Arc<dyn Platform>) -> Self {
        Self {
            platform,
            in_flight: Mutex::new(HashSet::new()),
        }
    }

    pub fn lock_pid(&self, pid: u32) -> Result<PidGuard<'_>> {
        if !self.in_flight.lock().insert(pid) {
            log::debug!("Rejecting concurrent mutation of pid {}", pid);
            return Err(EngineError::Busy(pid));
        }
        Ok(PidGuard {
            pid,
            in_flight: &self.in_flight,
        })
    }

    pub fn core_count(&self) -> usize {
        self.platform.core_count()
    }

    pub fn list(&self, filter: &ProcessFilter, default_per_page: usize) -> Result<ProcessPage> {
        let records = self.platform.list_processes()?;
        let index = ProcessIndex::build(&records);
        let page = filter::apply(&records, filter, default_per_page)?;

        let core_count = self.core_count();
        let processes = page
            .records
            .iter()
            .map(|record| {
                let mut snapshot = ProcessSnapshot::from_record(record, index.is_orphaned(record));
                snapshot.affinity_set = self.is_pinned(record.pid, core_count);
                snapshot
            })
            .collect();

        Ok(ProcessPage {
            processes,
            total_count: page.total_count,
        })
    }

    /// Snapshot of `pid` with its direct children, rebuilt from a fresh listing
    pub fn detail(&self, pid: u32) -> Result<ProcessSnapshot> {
        let records = self.platform.list_processes()?;
        let index = ProcessIndex::build(&records);
        let record = index
            .get(pid)
            .ok_or_else(|| EngineError::not_found(format!("process {} does not exist", pid)))?;

        let mut snapshot = ProcessSnapshot::from_record(record, index.is_orphaned(record));
        snapshot.affinity_set = self.is_pinned(pid, self.core_count());
        snapshot.children = index
            .children_of(pid)
            .iter()
            .map(|child| ChildSummary::from(*child))
            .collect();
        Ok(snapshot)
    }

    /// Affinity is advisory for listings: a process whose mask cannot be
    /// read is reported as not pinned
    fn is_pinned(&self, pid: u32, core_count: usize) -> bool {
        match self.platform.get_affinity(pid) {
            Ok(current_mask) => CpuAffinityInfo {
                core_count,
                current_mask,
            }
            .is_restricted(),
            Err(_) => false,
        }
    }

    pub fn kill(&self, pid: u32) -> Result<()> {
        let _guard = self.lock_pid(pid)?;
        self.platform.terminate(pid)?;
        log::info!("Terminated process {}", pid);
        Ok(())
    }

    pub fn suspend(&self, pid: u32) -> Result<()> {
        let _guard = self.lock_pid(pid)?;
        self.platform.suspend(pid)?;
        log::info!("Suspended process {}", pid);
        Ok(())
    }

    pub fn resume(&self, pid: u32) -> Result<()> {
        let _guard = self.lock_pid(pid)?;
        self.platform.resume(pid)?;
        log::info!("Resumed process {}", pid);
        Ok(())
    }

    pub fn get_affinity(&self, pid: u32) -> Result<CpuAffinityInfo> {
        let current_mask = self.platform.get_affinity(pid)?;
        Ok(CpuAffinityInfo {
            core_count: self.core_count(),
            current_mask,
        })
    }

    /// Validation happens before any OS call: the set must be non-empty and
    /// every index below the core count.
    pub fn set_affinity(&self, pid: u32, cores: &BTreeSet<usize>) -> Result<()> {
        validate_cores(cores, self.core_count())?;

        let _guard = self.lock_pid(pid)?;
        self.platform.set_affinity(pid, cores)?;
        log::info!("Set affinity of process {} to {:?}", pid, cores);
        Ok(())
    }

    /// Raise priority to High, then narrow affinity to the performance
    /// cores when the CPU has a detectable performance/efficiency split.
    ///
    /// A priority failure aborts before anything changes. Affinity problems
    /// after that are reported in the [`BoostReport`], not as an error.
    pub fn boost_for_gaming(&self, pid: u32) -> Result<BoostReport> {
        let _guard = self.lock_pid(pid)?;

        self.platform.set_priority(pid, PriorityClass::High)?;
        log::info!("Raised process {} to high priority", pid);

        let core_count = self.core_count();
        let affinity = match self.platform.performance_cores() {
            Ok(Some(cores))
                if !cores.is_empty()
                    && cores.len() < core_count
                    && cores.iter().all(|&c| c < core_count) =>
            {
                match self.platform.set_affinity(pid, &cores) {
                    Ok(()) => {
                        log::info!("Pinned process {} to performance cores {:?}", pid, cores);
                        AffinityOutcome::Restricted { cores }
                    }
                    Err(PlatformError::Unsupported(what)) => AffinityOutcome::Skipped {
                        reason: format!("{} is not supported on this platform", what),
                    },
                    Err(e) => {
                        let message = EngineError::from(e).to_string();
                        log::warn!("Boost of {} kept priority only: {}", pid, message);
                        AffinityOutcome::Failed { message }
                    }
                }
            }
            Ok(_) => AffinityOutcome::Skipped {
                reason: "no performance/efficiency core split detected".to_string(),
            },
            Err(e) => AffinityOutcome::Skipped {
                reason: format!("core topology unavailable: {}", EngineError::from(e)),
            },
        };

        Ok(BoostReport {
            pid,
            priority_raised: true,
            affinity,
        })
    }
}

pub fn validate_cores(cores: &BTreeSet<usize>, core_count: usize) -> Result<()> {
    if cores.is_empty() {
        return Err(EngineError::invalid_argument(
            "affinity must include at least one core",
        ));
    }
    if let Some(&bad) = cores.iter().find(|&&c| c >= core_count) {
        return Err(EngineError::invalid_argument(format!(
            "core index {} is out of range (this system has {} cores)",
            bad, core_count
        )));
    }
    Ok(())
}
