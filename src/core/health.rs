//! Per-category sampling health.

use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::core::stats::{StatCategory, StatSample};
use crate::error::Result;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryHealth {
    pub healthy: bool,
    pub error_count: u64,
}

impl Default for CategoryHealth {
    fn default() -> Self {
        Self {
            healthy: true,
            error_count: 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthSnapshot {
    pub categories: BTreeMap<StatCategory, CategoryHealth>,
    pub overall_healthy: bool,
    /// When this snapshot was produced
    pub last_check: DateTime<Utc>,
}

impl HealthSnapshot {
    pub fn category(&self, category: StatCategory) -> CategoryHealth {
        self.categories.get(&category).copied().unwrap_or_default()
    }
}

#[derive(Debug, Default)]
struct HealthState {
    categories: HashMap<StatCategory, CategoryHealth>,
    last_good: HashMap<StatCategory, StatSample>,
}

/// Counts sampling failures and serves the last good sample when one fails.
///
/// Owned by the engine; state lives from construction until an explicit
/// [`HealthMonitor::reset`].
#[derive(Debug, Default)]
pub struct HealthMonitor {
    state: Mutex<HealthState>,
}

impl HealthMonitor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `sampler` for `category`, recording the outcome. Never fails.
    pub fn sample<F>(&self, category: StatCategory, sampler: F) -> StatSample
    where
        F: FnOnce() -> Result<StatSample>,
    {
        match sampler() {
            Ok(sample) => {
                self.record_success(category);
                self.state.lock().last_good.insert(category, sample.clone());
                sample
            }
            Err(e) => {
                log::warn!("Sampling {} failed: {}", category, e);
                self.record_failure(category);
                self.state
                    .lock()
                    .last_good
                    .get(&category)
                    .cloned()
                    .unwrap_or_else(|| StatSample::unavailable(category))
            }
        }
    }

    pub fn record_success(&self, category: StatCategory) {
        let mut state = self.state.lock();
        state.categories.entry(category).or_default().healthy = true;
    }

    pub fn record_failure(&self, category: StatCategory) {
        let mut state = self.state.lock();
        let entry = state.categories.entry(category).or_default();
        entry.healthy = false;
        entry.error_count += 1;
    }

    pub fn snapshot(&self) -> HealthSnapshot {
        let state = self.state.lock();
        let categories: BTreeMap<StatCategory, CategoryHealth> = StatCategory::ALL
            .into_iter()
            .map(|c| (c, state.categories.get(&c).copied().unwrap_or_default()))
            .collect();
        let overall_healthy = categories.values().all(|h| h.healthy);

        HealthSnapshot {
            categories,
            overall_healthy,
            last_check: Utc::now(),
        }
    }

    /// Zero every error count; healthy flags stay as they are
    pub fn reset(&self) {
        let mut state = self.state.lock();
        for health in state.categories.values_mut() {
            health.error_count = 0;
        }
        log::info!("Monitor health counters reset");
    }
}
