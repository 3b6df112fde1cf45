//! Vedex Settings
//!
//! JSON-backed persistence for a service's config type. The dashboard
//! stores its gateway and aggregator tuning through `Settings<T>`.

pub mod paths;

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{de::DeserializeOwned, Serialize};
use thiserror::Error;
use tracing::{debug, info};

pub use paths::{default_config_dir_for, CONFIG_DIR_ENV};

#[derive(Error, Debug)]
pub enum SettingsError {
    #[error("failed to read settings at {path}: {source}")]
    Read { path: PathBuf, source: io::Error },
    #[error("failed to write settings at {path}: {source}")]
    Write { path: PathBuf, source: io::Error },
    #[error("failed to parse settings at {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("failed to encode settings: {0}")]
    Encode(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, SettingsError>;

/// A config value of type `T` bound to the file it was loaded from.
///
/// ```ignore
/// let settings: Settings<DashboardConfig> = Settings::load_or_default("vedex", None)?;
/// ```
#[derive(Debug)]
pub struct Settings<T> {
    pub config: T,
    path: PathBuf,
}

impl<T: Serialize + DeserializeOwned + Default> Settings<T> {
    /// Load from `custom_path` or the service's default location, writing
    /// `T::default()` there first if the file does not exist yet.
    pub fn load_or_default(service: &str, custom_path: Option<&Path>) -> Result<Self> {
        let path = custom_path
            .map(Path::to_path_buf)
            .unwrap_or_else(|| default_settings_path(service));

        if path.exists() {
            return Self::load(path);
        }

        info!(path = %path.display(), "writing default settings");
        let settings = Self {
            config: T::default(),
            path,
        };
        settings.save()?;
        Ok(settings)
    }

    /// Load an existing file. Missing keys fall back to their serde defaults.
    pub fn load(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        debug!(path = %path.display(), "loading settings");
        let content = fs::read_to_string(&path).map_err(|source| SettingsError::Read {
            path: path.clone(),
            source,
        })?;
        let config = serde_json::from_str(&content).map_err(|source| SettingsError::Parse {
            path: path.clone(),
            source,
        })?;
        Ok(Self { config, path })
    }

    pub fn save(&self) -> Result<()> {
        let content = serde_json::to_string_pretty(&self.config)?;
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|source| SettingsError::Write {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        fs::write(&self.path, content).map_err(|source| SettingsError::Write {
            path: self.path.clone(),
            source,
        })
    }

    /// Apply `change` and persist the result.
    pub fn update(&mut self, change: impl FnOnce(&mut T)) -> Result<()> {
        change(&mut self.config);
        self.save()
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// `settings.json` inside the service's config directory.
pub fn default_settings_path(service: &str) -> PathBuf {
    default_config_dir_for(service).join("settings.json")
}
