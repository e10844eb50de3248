use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use super::catalog::{self, Category, Effect, Optimization, RiskLevel, Scope};
use crate::error::{EngineError, Result};
use crate::platform::{Platform, PlatformError, PriorityClass, SettingValue};

/// Catalog entry plus its state as probed from the OS
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptimizationDescriptor {
    pub id: String,
    pub name: String,
    pub description: String,
    pub category: Category,
    pub platform: Scope,
    pub requires_admin: bool,
    pub is_reversible: bool,
    pub risk_level: RiskLevel,
    pub needs_restart: bool,
    pub applied: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptimizationGroup {
    pub category: Category,
    pub name: String,
    pub items: Vec<OptimizationDescriptor>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplyOutcome {
    pub message: String,
    pub needs_restart: bool,
}

/// Value seen on the OS right before an apply overwrote it
#[derive(Debug, Clone, PartialEq)]
enum RevertHint {
    Setting(SettingValue),
    Priority(PriorityClass),
}

pub struct OptimizationRegistry {
    platform: Arc<dyn Platform>,
    catalog: Vec<Optimization>,
    hints: Mutex<HashMap<&'static str, RevertHint>>,
}

impl OptimizationRegistry {
    pub fn new(platform: Arc<dyn Platform>) -> Self {
        Self::with_catalog(platform, catalog::builtin().to_vec())
    }

    pub fn with_catalog(platform: Arc<dyn Platform>, catalog: Vec<Optimization>) -> Self {
        Self {
            platform,
            catalog,
            hints: Mutex::new(HashMap::new()),
        }
    }

    /// Optimizations for this OS, grouped by category in catalog order
    pub fn list_available(&self) -> Vec<OptimizationGroup> {
        let os = self.platform.kind();
        let mut groups: Vec<OptimizationGroup> = Vec::new();

        for opt in self.catalog.iter().filter(|o| o.scope.includes(os)) {
            let descriptor = self.describe(opt);
            match groups.iter_mut().find(|g| g.category == opt.category) {
                Some(group) => group.items.push(descriptor),
                None => groups.push(OptimizationGroup {
                    category: opt.category,
                    name: opt.category.display_name().to_string(),
                    items: vec![descriptor],
                }),
            }
        }

        groups
    }

    pub fn apply(&self, id: &str) -> Result<ApplyOutcome> {
        let opt = self.lookup(id)?;
        self.check_admin(opt)?;

        let message = match &opt.effect {
            Effect::Setting { key, applied, .. } => {
                match self.platform.read_os_setting(*key) {
                    Ok(previous) if !previous.matches(applied) => {
                        log::debug!("Remembering {} = {} before {}", key, previous, opt.id);
                        self.hints.lock().insert(opt.id, RevertHint::Setting(previous));
                    }
                    Ok(_) => {}
                    Err(e) => log::debug!("Could not read {} before apply: {}", key, e),
                }
                self.platform.write_os_setting(*key, applied)?;
                format!("{} applied", opt.name)
            }
            Effect::EnginePriority { applied, .. } => {
                let pid = std::process::id();
                if let Ok(previous) = self.platform.get_priority(pid) {
                    if previous != *applied {
                        self.hints.lock().insert(opt.id, RevertHint::Priority(previous));
                    }
                }
                self.platform.set_priority(pid, *applied)?;
                format!("{} applied", opt.name)
            }
            Effect::OneShot(action) => {
                let detail = self.platform.run_action(*action)?;
                if detail.is_empty() {
                    format!("{} completed", opt.name)
                } else {
                    format!("{} completed: {}", opt.name, detail)
                }
            }
        };

        log::info!("Applied optimization {}", opt.id);
        Ok(ApplyOutcome {
            message,
            needs_restart: opt.needs_restart,
        })
    }

    pub fn revert(&self, id: &str) -> Result<ApplyOutcome> {
        let opt = self.lookup(id)?;
        if !opt.is_reversible {
            return Err(EngineError::NotReversible(opt.id.to_string()));
        }
        self.check_admin(opt)?;

        let hint = self.hints.lock().get(opt.id).cloned();
        match &opt.effect {
            Effect::Setting { key, default, .. } => {
                let target = match hint {
                    Some(RevertHint::Setting(value)) => value,
                    _ => default.clone(),
                };
                self.platform.write_os_setting(*key, &target)?;
            }
            Effect::EnginePriority { default, .. } => {
                let target = match hint {
                    Some(RevertHint::Priority(class)) => class,
                    _ => *default,
                };
                self.platform.set_priority(std::process::id(), target)?;
            }
            Effect::OneShot(_) => return Err(EngineError::NotReversible(opt.id.to_string())),
        }

        log::info!("Reverted optimization {}", opt.id);
        Ok(ApplyOutcome {
            message: format!("{} reverted", opt.name),
            needs_restart: opt.needs_restart,
        })
    }

    /// Whether the OS currently reflects the optimization's applied value
    pub fn is_applied(&self, opt: &Optimization) -> bool {
        match &opt.effect {
            Effect::Setting { key, applied, .. } => match self.platform.read_os_setting(*key) {
                Ok(current) => current.matches(applied),
                Err(PlatformError::SettingUnavailable(_)) | Err(PlatformError::Unsupported(_)) => {
                    false
                }
                Err(e) => {
                    log::debug!("Probing {} failed: {}", key, e);
                    false
                }
            },
            Effect::EnginePriority { applied, .. } => self
                .platform
                .get_priority(std::process::id())
                .map(|class| class == *applied)
                .unwrap_or(false),
            Effect::OneShot(_) => false,
        }
    }

    fn describe(&self, opt: &Optimization) -> OptimizationDescriptor {
        OptimizationDescriptor {
            id: opt.id.to_string(),
            name: opt.name.to_string(),
            description: opt.description.to_string(),
            category: opt.category,
            platform: opt.scope,
            requires_admin: opt.requires_admin,
            is_reversible: opt.is_reversible,
            risk_level: opt.risk_level,
            needs_restart: opt.needs_restart,
            applied: self.is_applied(opt),
        }
    }

    fn lookup(&self, id: &str) -> Result<&Optimization> {
        let opt = self
            .catalog
            .iter()
            .find(|o| o.id == id)
            .ok_or_else(|| EngineError::not_found(format!("optimization '{}'", id)))?;

        if !opt.scope.includes(self.platform.kind()) {
            return Err(EngineError::PlatformMismatch {
                id: opt.id.to_string(),
                scope: opt.scope.to_string(),
            });
        }
        Ok(opt)
    }

    fn check_admin(&self, opt: &Optimization) -> Result<()> {
        if opt.requires_admin && !self.platform.is_elevated() {
            return Err(EngineError::permission_denied(format!(
                "'{}' requires administrator privileges",
                opt.id
            )));
        }
        Ok(())
    }
}
