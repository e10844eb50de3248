//! Process listing, inspection and control.

pub mod filter;
pub mod registry;
pub mod snapshot;
pub mod tree;

pub use filter::{ProcessFilter, SortKey, SortOrder};
pub use registry::{validate_cores, ProcessPage, ProcessRegistry};
pub use snapshot::{AffinityOutcome, BoostReport, ChildSummary, CpuAffinityInfo, ProcessSnapshot};
