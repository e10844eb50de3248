//! Filtering, sorting and paging of process listings.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{EngineError, Result};
use crate::platform::{ProcessRecord, ProcessStatus};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortKey {
    Name,
    #[default]
    Cpu,
    Memory,
    Pid,
}

impl FromStr for SortKey {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "name" => Ok(SortKey::Name),
            "cpu" => Ok(SortKey::Cpu),
            "memory" | "mem" => Ok(SortKey::Memory),
            "pid" => Ok(SortKey::Pid),
            other => Err(EngineError::invalid_argument(format!(
                "unknown sort key '{}' (expected name, cpu, memory or pid)",
                other
            ))),
        }
    }
}

impl fmt::Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SortKey::Name => "name",
            SortKey::Cpu => "cpu",
            SortKey::Memory => "memory",
            SortKey::Pid => "pid",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

impl FromStr for SortOrder {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "asc" | "ascending" => Ok(SortOrder::Asc),
            "desc" | "descending" => Ok(SortOrder::Desc),
            other => Err(EngineError::invalid_argument(format!(
                "unknown sort order '{}' (expected asc or desc)",
                other
            ))),
        }
    }
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SortOrder::Asc => f.write_str("asc"),
            SortOrder::Desc => f.write_str("desc"),
        }
    }
}

/// Query for `list_processes`. Every field is optional; `per_page` falls
/// back to the configured default when absent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProcessFilter {
    /// Case-insensitive name substring, or an exact pid
    pub search_query: Option<String>,
    pub status: Option<ProcessStatus>,
    pub min_cpu: Option<f32>,
    /// Minimum working set, bytes
    pub min_memory: Option<u64>,
    pub sort_by: Option<SortKey>,
    pub sort_order: Option<SortOrder>,
    /// Zero-based
    pub page: usize,
    pub per_page: Option<usize>,
}

impl ProcessFilter {
    pub fn search(mut self, query: impl Into<String>) -> Self {
        self.search_query = Some(query.into());
        self
    }

    pub fn sorted(mut self, key: SortKey, order: SortOrder) -> Self {
        self.sort_by = Some(key);
        self.sort_order = Some(order);
        self
    }

    pub fn paged(mut self, page: usize, per_page: usize) -> Self {
        self.page = page;
        self.per_page = Some(per_page);
        self
    }

    fn matches(&self, record: &ProcessRecord, query: Option<&Query>) -> bool {
        if let Some(query) = query {
            let by_name = record.name.to_lowercase().contains(&query.lowered);
            let by_pid = query.pid == Some(record.pid);
            if !by_name && !by_pid {
                return false;
            }
        }
        if let Some(status) = self.status {
            if record.status != status {
                return false;
            }
        }
        if let Some(min_cpu) = self.min_cpu {
            if record.cpu_usage_percent < min_cpu {
                return false;
            }
        }
        if let Some(min_memory) = self.min_memory {
            if record.memory.working_set < min_memory {
                return false;
            }
        }
        true
    }
}

struct Query {
    lowered: String,
    pid: Option<u32>,
}

/// One page of a filtered listing plus the size of the whole filtered set
#[derive(Debug)]
pub struct FilteredPage<'a> {
    pub records: Vec<&'a ProcessRecord>,
    pub total_count: usize,
}

/// Filter, sort (stable, ties by ascending pid) and page `records`.
///
/// A page past the end is empty, not an error; `per_page == 0` is.
pub fn apply<'a>(
    records: &'a [ProcessRecord],
    filter: &ProcessFilter,
    default_per_page: usize,
) -> Result<FilteredPage<'a>> {
    let per_page = filter.per_page.unwrap_or(default_per_page);
    if per_page == 0 {
        return Err(EngineError::invalid_argument("per_page must be greater than zero"));
    }

    let query = filter
        .search_query
        .as_deref()
        .map(str::trim)
        .filter(|q| !q.is_empty())
        .map(|q| Query {
            lowered: q.to_lowercase(),
            pid: q.parse().ok(),
        });

    let mut matched: Vec<&ProcessRecord> = records
        .iter()
        .filter(|r| filter.matches(r, query.as_ref()))
        .collect();

    let key = filter.sort_by.unwrap_or_default();
    let order = filter.sort_order.unwrap_or_default();
    matched.sort_by(|a, b| {
        let primary = compare(a, b, key);
        let primary = match order {
            SortOrder::Asc => primary,
            SortOrder::Desc => primary.reverse(),
        };
        primary.then_with(|| a.pid.cmp(&b.pid))
    });

    let total_count = matched.len();
    let records = matched
        .into_iter()
        .skip(filter.page.saturating_mul(per_page))
        .take(per_page)
        .collect();

    Ok(FilteredPage {
        records,
        total_count,
    })
}

fn compare(a: &ProcessRecord, b: &ProcessRecord, key: SortKey) -> Ordering {
    match key {
        SortKey::Name => a.name.to_lowercase().cmp(&b.name.to_lowercase()),
        SortKey::Cpu => a.cpu_usage_percent.total_cmp(&b.cpu_usage_percent),
        SortKey::Memory => a.memory.working_set.cmp(&b.memory.working_set),
        SortKey::Pid => a.pid.cmp(&b.pid),
    }
}
