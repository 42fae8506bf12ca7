use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ShipError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Filesystem error: failed to {operation} {path}: {source}")]
    Filesystem {
        operation: &'static str,
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),
}

impl ShipError {
    pub fn filesystem(operation: &'static str, path: &Path, source: std::io::Error) -> Self {
        ShipError::Filesystem {
            operation,
            path: path.to_path_buf(),
            source,
        }
    }

    /// Unsupported or incomplete descriptors; retrying will not help.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            ShipError::Configuration(_) | ShipError::Yaml(_) | ShipError::Toml(_)
        )
    }

    pub fn is_filesystem(&self) -> bool {
        matches!(self, ShipError::Filesystem { .. })
    }
}

pub type Result<T> = std::result::Result<T, ShipError>;
