use crate::error::{Result, ShipError};
use crate::stage::SIDECAR_EXTENSIONS;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;


/// Keys whose branches hold literal parameter values rather than files
pub const DEFAULT_IGNORE_KEYS: &[&str] = &["algorithm"];

pub const DEFAULT_WORKDIR_PREFIX: &str = "bcbio-work";

/// Get the global directory holding `config.toml`
pub fn get_global_config_dir() -> Option<PathBuf> {
    ProjectDirs::from("org", "bcbio", "bcbio-ship").map(|dirs| dirs.config_dir().to_path_buf())
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StagingConfig {
    /// Index suffixes copied next to each staged file
    pub sidecar_extensions: Vec<String>,
    /// Top-level argument keys never used to discover external directories
    pub ignore_keys: Vec<String>,
    /// Name prefix for per-task workspaces under the scratch directory
    pub workdir_prefix: String,
    pub log_level: Option<String>,
}

impl Default for StagingConfig {
    fn default() -> Self {
        Self {
            sidecar_extensions: SIDECAR_EXTENSIONS.iter().map(|e| e.to_string()).collect(),
            ignore_keys: DEFAULT_IGNORE_KEYS.iter().map(|k| k.to_string()).collect(),
            workdir_prefix: DEFAULT_WORKDIR_PREFIX.to_string(),
            log_level: None,
        }
    }
}

impl StagingConfig {
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: StagingConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| ShipError::filesystem("read", path, e))?;
        Self::from_toml_str(&content)
    }

    /// Load from `path` if given, else the global config file if present,
    /// else defaults; environment overrides apply last.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => match get_global_config_dir().map(|dir| dir.join("config.toml")) {
                Some(global) if global.exists() => {
                    debug!("Loading configuration from {}", global.display());
                    Self::from_file(&global)?
                }
                _ => Self::default(),
            },
        };
        config.merge_env_vars();
        config.validate()?;
        Ok(config)
    }

    pub fn merge_env_vars(&mut self) {
        self.merge_vars(|key| std::env::var(key).ok());
    }

    fn merge_vars<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(prefix) = lookup("BCBIO_SHIP_WORKDIR_PREFIX") {
            self.workdir_prefix = prefix;
        }

        if let Some(level) = lookup("BCBIO_SHIP_LOG_LEVEL") {
            self.log_level = Some(level);
        }

        if let Some(sidecars) = lookup("BCBIO_SHIP_SIDECARS") {
            self.sidecar_extensions = sidecars
                .split(',')
                .map(|ext| ext.trim().to_string())
                .collect();
        }
    }

    fn validate(&self) -> Result<()> {
        if self.workdir_prefix.is_empty()
            || self.workdir_prefix.contains(std::path::MAIN_SEPARATOR)
        {
            return Err(ShipError::Configuration(format!(
                "workdir_prefix must be a single non-empty path component, got {:?}",
                self.workdir_prefix
            )));
        }
        Ok(())
    }
}
