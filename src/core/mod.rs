// Core engine logic

pub mod config;
pub mod engine;
pub mod health;
pub mod optimization;
pub mod process;
pub mod response;
pub mod stats;

// Re-export commonly used items
pub use config::EngineConfig;
pub use engine::Engine;
pub use health::{CategoryHealth, HealthMonitor, HealthSnapshot};
pub use optimization::{OptimizationDescriptor, OptimizationGroup, OptimizationRegistry};
pub use process::{ProcessFilter, ProcessPage, ProcessRegistry, ProcessSnapshot, SortKey, SortOrder};
pub use response::ActionResponse;
pub use stats::{StatCategory, StatSample, StatsCollector};
