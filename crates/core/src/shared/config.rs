use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::detection::domain::detection_params::{DetectionParams, NetworkInfo};
use crate::detection::infrastructure::face_extractor::ResolutionContext;
use crate::shared::constants::{
    CONFIG_DIR_NAME, CONFIG_FILE_NAME, DEFAULT_NETWORK_HEIGHT, DEFAULT_NETWORK_WIDTH,
    DEFAULT_THRESHOLD,
};

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to write config {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Decoder settings persisted as JSON. Missing fields take their defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DecoderConfig {
    pub network_width: u32,
    pub network_height: u32,
    /// Precluster threshold per class id.
    pub class_thresholds: Vec<f32>,
    pub margin: i32,
    pub resolution: ResolutionContext,
    pub verbose: bool,
    pub workers: usize,
}

fn default_workers() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}

impl Default for DecoderConfig {
    fn default() -> Self {
        Self {
            network_width: DEFAULT_NETWORK_WIDTH,
            network_height: DEFAULT_NETWORK_HEIGHT,
            class_thresholds: vec![DEFAULT_THRESHOLD],
            margin: 0,
            resolution: ResolutionContext::default(),
            verbose: false,
            workers: default_workers(),
        }
    }
}

impl DecoderConfig {
    /// `<config_dir>/detparse/config.json`, if the platform has a config dir.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME))
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let json = fs::read_to_string(path).map_err(|e| ConfigError::Read {
            path: path.to_path_buf(),
            source: e,
        })?;
        let config: Self = serde_json::from_str(&json).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            source: e,
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Loads from the default location, falling back to defaults when no
    /// file exists there.
    pub fn load_or_default() -> Result<Self, ConfigError> {
        match Self::default_path() {
            Some(path) if path.is_file() => Self::load(&path),
            _ => Ok(Self::default()),
        }
    }

    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let write_err = |e: std::io::Error| ConfigError::Write {
            path: path.to_path_buf(),
            source: e,
        };
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(write_err)?;
        }
        let json = serde_json::to_string_pretty(self).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            source: e,
        })?;
        fs::write(path, json).map_err(write_err)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.network_width == 0 || self.network_height == 0 {
            return Err(ConfigError::Invalid(format!(
                "network resolution must be non-zero, got {}x{}",
                self.network_width, self.network_height
            )));
        }
        if self.class_thresholds.is_empty() {
            return Err(ConfigError::Invalid(
                "class_thresholds must list at least one class".to_string(),
            ));
        }
        if let Some(i) = self.class_thresholds.iter().position(|t| !t.is_finite()) {
            return Err(ConfigError::Invalid(format!(
                "class_thresholds[{i}] is not finite"
            )));
        }
        if self.workers == 0 {
            return Err(ConfigError::Invalid("workers must be at least 1".to_string()));
        }
        Ok(())
    }

    pub fn network(&self) -> NetworkInfo {
        NetworkInfo::new(self.network_width, self.network_height)
    }

    pub fn detection_params(&self) -> Result<DetectionParams, ConfigError> {
        DetectionParams::new(self.class_thresholds.clone(), self.network())
            .map_err(|e| ConfigError::Invalid(e.to_string()))
    }
}
