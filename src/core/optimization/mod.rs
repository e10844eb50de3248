//! Catalog of named system tweaks and the registry that applies them.

pub mod catalog;
pub mod registry;

pub use catalog::{Category, Effect, Optimization, RiskLevel, Scope};
pub use registry::{ApplyOutcome, OptimizationDescriptor, OptimizationGroup, OptimizationRegistry};
