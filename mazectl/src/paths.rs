//! Cross-platform application paths

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::CliError;

#[derive(Debug, Clone)]
pub struct AppPaths {
    config_dir: PathBuf,
    data_dir: PathBuf,
}

impl AppPaths {
    pub fn new() -> Result<Self, CliError> {
        let data_dir = dirs::data_dir().ok_or(CliError::NoDataDir)?.join("micromaze");
        // Fall back to the data directory on platforms without a config dir.
        let config_dir = dirs::config_dir()
            .map(|d| d.join("micromaze"))
            .unwrap_or_else(|| data_dir.clone());

        fs::create_dir_all(&data_dir)?;
        Ok(Self {
            config_dir,
            data_dir,
        })
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn config_file(&self) -> PathBuf {
        self.config_dir.join("config.json")
    }

    /// Default home of downloaded maze files.
    pub fn maze_dir(&self) -> PathBuf {
        self.data_dir.join("mazes")
    }
}
