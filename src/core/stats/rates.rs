//! Per-second rates from cumulative counters.

use std::collections::{HashMap, HashSet};
use std::time::Instant;

/// Remembers the previous reading of each instance's counters.
///
/// A rate is zero on the first reading of an instance, when no time has
/// passed, and for a counter that went backwards (driver reset, wrap).
#[derive(Debug, Default)]
pub struct RateTracker {
    previous: HashMap<String, (Vec<u64>, Instant)>,
}

impl RateTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `counters` for `instance` and return one rate per counter
    pub fn observe(&mut self, instance: &str, counters: &[u64], now: Instant) -> Vec<f64> {
        let rates = match self.previous.get(instance) {
            Some((prev, at)) if prev.len() == counters.len() => {
                let elapsed = now.saturating_duration_since(*at).as_secs_f64();
                if elapsed > 0.0 {
                    counters
                        .iter()
                        .zip(prev)
                        .map(|(current, prev)| current.saturating_sub(*prev) as f64 / elapsed)
                        .collect()
                } else {
                    vec![0.0; counters.len()]
                }
            }
            _ => vec![0.0; counters.len()],
        };

        self.previous
            .insert(instance.to_string(), (counters.to_vec(), now));
        rates
    }

    /// Forget instances that are no longer reported
    pub fn retain_only<'a, I>(&mut self, live: I)
    where
        I: IntoIterator<Item = &'a str>,
    {
        let live: HashSet<&str> = live.into_iter().collect();
        self.previous.retain(|name, _| live.contains(name.as_str()));
    }

    pub fn len(&self) -> usize {
        self.previous.len()
    }

    pub fn is_empty(&self) -> bool {
        self.previous.is_empty()
    }
}
