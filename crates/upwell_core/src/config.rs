//! User configuration.
//!
//! The configuration records who the local author is and where bundles are
//! kept. It is persisted as TOML (typically at `~/.config/upwell/config.toml`
//! on Unix systems).
//!
//! # Example
//!
//! ```ignore
//! use upwell_core::config::Config;
//!
//! let config = Config::init("Ada", "/home/ada/Upwell".into());
//! config.save()?;
//!
//! let author = Config::load()?.author();
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::author::{Author, UNKNOWN_AUTHOR, create_author_id};
use crate::error::{Result, UpwellError};

/// Settings for the local author and library.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Persistent author id, generated once by [`Config::init`]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author_id: Option<String>,

    /// Display name recorded in every bundle this author touches
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author_name: Option<String>,

    /// Directory holding one `.upwell` file per bundle
    pub library_dir: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        let library_dir = dirs::data_dir()
            .or_else(dirs::home_dir)
            .unwrap_or_else(|| PathBuf::from("."))
            .join("upwell");
        Self {
            author_id: None,
            author_name: None,
            library_dir,
        }
    }
}

impl Config {
    /// Create a config for a new author with a freshly generated id.
    pub fn init(name: &str, library_dir: PathBuf) -> Self {
        Self {
            author_id: Some(create_author_id()),
            author_name: Some(name.to_string()),
            library_dir,
        }
    }

    /// The configured author.
    ///
    /// Without a stored id, a new one is generated on every call, so callers
    /// that need a stable identity should [`Config::init`] and save first.
    pub fn author(&self) -> Author {
        let name = self
            .author_name
            .clone()
            .unwrap_or_else(|| UNKNOWN_AUTHOR.name.clone());
        match &self.author_id {
            Some(id) => Author {
                id: id.clone(),
                name,
            },
            None => Author::new(name),
        }
    }

    /// Get the default config file path
    pub fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("upwell").join("config.toml"))
    }

    /// Load config from the default location, or the default config if
    /// there is none yet
    pub fn load() -> Result<Self> {
        match Self::config_path() {
            Some(path) if path.exists() => Self::load_from(&path),
            _ => Ok(Config::default()),
        }
    }

    /// Load config from a specific file
    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        Ok(config)
    }

    /// Save config to the default location
    pub fn save(&self) -> Result<()> {
        let path = Self::config_path().ok_or(UpwellError::NoConfigDir)?;
        self.save_to(&path)
    }

    /// Save config to a specific file, creating parent directories
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = toml::to_string_pretty(self)?;
        std::fs::write(path, contents)?;
        log::debug!("saved config to {}", path.display());
        Ok(())
    }
}
