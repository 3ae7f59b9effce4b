//! Accessor configuration

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use qprefs_storage::LocalSessionFactory;

use crate::error::PrefError;
use crate::Result;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Path to the local administration database
    pub database_path: PathBuf,
}

impl Config {
    pub fn new(data_dir: PathBuf) -> Self {
        Self {
            database_path: data_dir.join("qprefs.db"),
        }
    }

    pub fn data_dir() -> PathBuf {
        dirs::data_local_dir()
            .map(|d| d.join("qprefs"))
            .unwrap_or_else(|| PathBuf::from(".qprefs"))
    }

    /// Read a JSON configuration file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| PrefError::Config(format!("{}: {}", path.display(), e)))?;

        serde_json::from_str(&text)
            .map_err(|e| PrefError::Config(format!("{}: {}", path.display(), e)))
    }

    /// Open the local backend described by this configuration
    pub fn local_factory(&self) -> Result<LocalSessionFactory> {
        if let Some(parent) = self.database_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)
                    .map_err(|e| PrefError::Config(format!("{}: {}", parent.display(), e)))?;
            }
        }

        tracing::debug!(path = %self.database_path.display(), "Opening local backend");
        Ok(LocalSessionFactory::open(&self.database_path)?)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new(Self::data_dir())
    }
}

mod dirs {
    use std::path::PathBuf;

    pub fn data_local_dir() -> Option<PathBuf> {
        std::env::var("XDG_DATA_HOME")
            .ok()
            .filter(|d| !d.is_empty())
            .map(PathBuf::from)
            .or_else(|| {
                std::env::var("HOME")
                    .ok()
                    .map(|h| PathBuf::from(h).join(".local/share"))
            })
    }
}
