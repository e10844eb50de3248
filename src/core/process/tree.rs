//! Parent/child relationships resolved by pid lookup into one listing.
//!
//! Processes exit and re-parent between calls, so nothing here is kept
//! across queries.

use std::collections::HashMap;

use crate::platform::ProcessRecord;

/// Pid index over a single process listing
pub struct ProcessIndex<'a> {
    by_pid: HashMap<u32, &'a ProcessRecord>,
    children: HashMap<u32, Vec<&'a ProcessRecord>>,
}

impl<'a> ProcessIndex<'a> {
    pub fn build(records: &'a [ProcessRecord]) -> Self {
        let by_pid: HashMap<u32, &ProcessRecord> = records.iter().map(|r| (r.pid, r)).collect();

        let mut children: HashMap<u32, Vec<&ProcessRecord>> = HashMap::new();
        for record in records {
            if let Some(ppid) = record.parent_pid {
                // some kernels report a process as its own parent (pid 0 on Windows)
                if ppid != record.pid {
                    children.entry(ppid).or_default().push(record);
                }
            }
        }
        for list in children.values_mut() {
            list.sort_by_key(|r| r.pid);
        }

        Self { by_pid, children }
    }

    pub fn get(&self, pid: u32) -> Option<&'a ProcessRecord> {
        self.by_pid.get(&pid).copied()
    }

    /// Direct children, ascending by pid
    pub fn children_of(&self, pid: u32) -> &[&'a ProcessRecord] {
        self.children.get(&pid).map(Vec::as_slice).unwrap_or(&[])
    }

    /// A parent pid that does not resolve in this listing
    pub fn is_orphaned(&self, record: &ProcessRecord) -> bool {
        match record.parent_pid {
            Some(ppid) if ppid != record.pid => !self.by_pid.contains_key(&ppid),
            _ => false,
        }
    }
}
