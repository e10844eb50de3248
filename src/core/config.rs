use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Environment variable that overrides the config file location
pub const CONFIG_ENV: &str = "RIGTUNE_CONFIG";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Page size used when a process listing does not specify one
    pub default_per_page: usize,
    /// Query NVML / sysfs / WMI for GPUs. Disabling skips driver loading entirely
    pub collect_gpu: bool,
    /// Leave kernel threads out of process listings
    pub hide_kernel_threads: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            default_per_page: 50,
            collect_gpu: true,
            hide_kernel_threads: false,
        }
    }
}

impl EngineConfig {
    pub fn load() -> Result<Self> {
        let config_path = Self::get_config_path()?;
        Self::load_from(&config_path)
    }

    /// Read a config file, falling back to defaults when it is missing,
    /// empty or unreadable as JSON
    pub fn load_from(config_path: &Path) -> Result<Self> {
        if !config_path.exists() {
            return Ok(EngineConfig::default());
        }

        let data = fs::read(config_path)
            .with_context(|| format!("Failed to read config file: {:?}", config_path))?;

        if data.is_empty() {
            return Ok(EngineConfig::default());
        }

        let mut config: EngineConfig = serde_json::from_slice(&data).unwrap_or_else(|e| {
            log::warn!(
                "Ignoring corrupt config file {:?} ({}), using defaults",
                config_path,
                e
            );
            EngineConfig::default()
        });

        if config.default_per_page == 0 {
            config.default_per_page = EngineConfig::default().default_per_page;
        }

        Ok(config)
    }

    pub fn save(&self) -> Result<()> {
        let config_path = Self::get_config_path()?;
        self.save_to(&config_path)
    }

    pub fn save_to(&self, config_path: &Path) -> Result<()> {
        if let Some(parent) = config_path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create config directory: {:?}", parent))?;
        }

        let data =
            serde_json::to_vec_pretty(self).with_context(|| "Failed to serialize config")?;

        fs::write(config_path, data)
            .with_context(|| format!("Failed to write config file: {:?}", config_path))?;

        Ok(())
    }

    pub fn get_config_path() -> Result<PathBuf> {
        if let Some(path) = std::env::var_os(CONFIG_ENV).filter(|p| !p.is_empty()) {
            return Ok(PathBuf::from(path));
        }

        let config_dir =
            dirs::config_dir().with_context(|| "Could not determine config directory")?;

        Ok(config_dir.join("rigtune").join("config.json"))
    }
}
