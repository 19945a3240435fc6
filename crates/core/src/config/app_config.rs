use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::camera::domain::device_policy::DevicePolicy;
use crate::capture::domain::capture_settings::CaptureSettings;
use crate::recognition::domain::engine_config::EngineConfiguration;
use crate::shared::constants::{APP_DIR_NAME, DETECTOR_MODEL_NAME};

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid config {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("failed to write config {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Everything configurable about an enrollment run, stored as JSON.
///
/// Missing fields take their defaults, so a config file only needs the
/// values it changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub device_policy: DevicePolicy,
    pub capture: CaptureSettings,
    pub engine: EngineConfiguration,
    pub detector_model: PathBuf,
    /// Where accepted crops are written; no thumbnails when unset.
    pub thumbnail_dir: Option<PathBuf>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            device_policy: DevicePolicy::default(),
            capture: CaptureSettings::default(),
            engine: EngineConfiguration::default(),
            detector_model: PathBuf::from(DETECTOR_MODEL_NAME),
            thumbnail_dir: None,
        }
    }
}

impl AppConfig {
    /// Per-user config file location.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join(APP_DIR_NAME).join("config.json"))
    }

    /// Loads `path` when given (it must exist and parse). Otherwise reads the
    /// per-user file if there is one, falling back to defaults.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = path {
            return Self::read(path);
        }
        match Self::default_path() {
            Some(path) if path.is_file() => Self::read(&path),
            _ => {
                log::debug!("No config file found, using defaults");
                Ok(Self::default())
            }
        }
    }

    pub fn read(path: &Path) -> Result<Self, ConfigError> {
        let json = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config = serde_json::from_str(&json).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        log::info!("Loaded config from {}", path.display());
        Ok(config)
    }

    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let write_err = |source| ConfigError::Write {
            path: path.to_path_buf(),
            source,
        };
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(write_err)?;
        }
        let json = serde_json::to_string_pretty(self).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        fs::write(path, json).map_err(write_err)
    }
}
