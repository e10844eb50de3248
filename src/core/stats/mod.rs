//! Resource telemetry: normalized samples and rate computation.

pub mod collector;
pub mod rates;
pub mod sample;

pub use collector::StatsCollector;
pub use rates::RateTracker;
pub use sample::{DetailEntry, ProgressEntry, StatCategory, StatSample};
