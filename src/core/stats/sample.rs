use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::EngineError;

/// Telemetry categories, also the keys of the health snapshot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatCategory {
    Cpu,
    Memory,
    Storage,
    Network,
    Gpu,
    System,
}

impl StatCategory {
    pub const ALL: [StatCategory; 6] = [
        StatCategory::Cpu,
        StatCategory::Memory,
        StatCategory::Storage,
        StatCategory::Network,
        StatCategory::Gpu,
        StatCategory::System,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            StatCategory::Cpu => "cpu",
            StatCategory::Memory => "memory",
            StatCategory::Storage => "storage",
            StatCategory::Network => "network",
            StatCategory::Gpu => "gpu",
            StatCategory::System => "system",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            StatCategory::Cpu => "CPU",
            StatCategory::Memory => "Memory",
            StatCategory::Storage => "Storage",
            StatCategory::Network => "Network",
            StatCategory::Gpu => "GPU",
            StatCategory::System => "System Info",
        }
    }
}

impl fmt::Display for StatCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StatCategory {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        StatCategory::ALL
            .into_iter()
            .find(|c| c.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| {
                EngineError::invalid_argument(format!("unknown stat category '{}'", s))
            })
    }
}

/// One bar in a sample: a core, a drive, an interface, a GPU
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressEntry {
    pub label: String,
    /// Clamped to 0-100
    pub percentage: f32,
    pub temperature_celsius: Option<f32>,
    pub power_watts: Option<f32>,
}

impl ProgressEntry {
    pub fn new(label: impl Into<String>, percentage: f32) -> Self {
        let percentage = if percentage.is_finite() {
            percentage.clamp(0.0, 100.0)
        } else {
            0.0
        };
        Self {
            label: label.into(),
            percentage,
            temperature_celsius: None,
            power_watts: None,
        }
    }

    pub fn with_temperature(mut self, celsius: Option<f32>) -> Self {
        self.temperature_celsius = celsius;
        self
    }

    pub fn with_power(mut self, watts: Option<f32>) -> Self {
        self.power_watts = watts;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DetailEntry {
    pub label: String,
    pub value: String,
}

impl DetailEntry {
    pub fn new(label: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            value: value.into(),
        }
    }
}

/// Normalized telemetry for one category, produced fresh per poll
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatSample {
    pub category: StatCategory,
    pub title: String,
    pub percentage: Option<f32>,
    pub progress: Vec<ProgressEntry>,
    pub details: Vec<DetailEntry>,
    pub timestamp: DateTime<Utc>,
}

impl StatSample {
    pub fn new(category: StatCategory, title: impl Into<String>) -> Self {
        Self {
            category,
            title: title.into(),
            percentage: None,
            progress: Vec::new(),
            details: Vec::new(),
            timestamp: Utc::now(),
        }
    }

    /// Stand-in returned when a category has never been sampled successfully
    pub fn unavailable(category: StatCategory) -> Self {
        Self::new(category, category.title()).with_detail("Status", "unavailable")
    }

    pub fn with_percentage(mut self, percentage: f32) -> Self {
        self.percentage = Some(if percentage.is_finite() {
            percentage.clamp(0.0, 100.0)
        } else {
            0.0
        });
        self
    }

    pub fn with_progress(mut self, entry: ProgressEntry) -> Self {
        self.progress.push(entry);
        self
    }

    pub fn with_detail(mut self, label: impl Into<String>, value: impl Into<String>) -> Self {
        self.details.push(DetailEntry::new(label, value));
        self
    }

    pub fn detail(&self, label: &str) -> Option<&str> {
        self.details
            .iter()
            .find(|d| d.label == label)
            .map(|d| d.value.as_str())
    }

    pub fn is_unavailable(&self) -> bool {
        self.detail("Status") == Some("unavailable")
    }
}
