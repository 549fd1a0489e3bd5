//! `config.json` plus environment overrides.
//!
//! Precedence, lowest first: built-in defaults, the config file, `MICROMAZE_*`
//! environment variables, command-line flags.

use std::fs;
use std::path::{Path, PathBuf};

use micromaze::agent::AgentConfig;
use micromaze::generate::GeneratorConfig;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::CliError;
use crate::paths::AppPaths;

pub const ENV_MAZE_DIR: &str = "MICROMAZE_MAZE_DIR";
pub const ENV_FORK_CHANCE: &str = "MICROMAZE_FORK_CHANCE";
pub const ENV_TURN_BIAS: &str = "MICROMAZE_TURN_BIAS";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CliConfig {
    /// Directory holding maze text files; defaults to the OS data directory.
    pub maze_dir: Option<PathBuf>,
    pub generator: GeneratorConfig,
    pub agent: AgentConfig,
}

impl CliConfig {
    /// Reads `path`; a missing or malformed file yields the defaults.
    pub fn load(path: &Path) -> Result<Self, CliError> {
        if !path.exists() {
            debug!(?path, "no config file, using defaults");
            return Ok(Self::default());
        }
        let text = fs::read_to_string(path)?;
        match serde_json::from_str(&text) {
            Ok(cfg) => Ok(cfg),
            Err(e) => {
                warn!(?path, "Ignoring malformed config file: {}", e);
                Ok(Self::default())
            }
        }
    }

    pub fn apply_env(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    /// Applies overrides from `lookup`; unparsable or out-of-range values are
    /// logged and ignored.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(dir) = lookup(ENV_MAZE_DIR) {
            let dir = dir.trim();
            if dir.is_empty() {
                warn!("Empty {} value ignored", ENV_MAZE_DIR);
            } else {
                self.maze_dir = Some(PathBuf::from(dir));
            }
        }
        if let Some(v) = probability(&lookup, ENV_FORK_CHANCE) {
            self.generator.fork_chance = v;
        }
        if let Some(v) = probability(&lookup, ENV_TURN_BIAS) {
            self.generator.turn_bias = v;
        }
    }

    pub fn maze_dir(&self, paths: &AppPaths) -> PathBuf {
        self.maze_dir.clone().unwrap_or_else(|| paths.maze_dir())
    }
}

fn probability(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<f64> {
    let raw = lookup(key)?;
    match raw.trim().parse::<f64>() {
        Ok(v) if (0.0..=1.0).contains(&v) => Some(v),
        Ok(v) => {
            warn!("{} value {} is outside [0, 1]; ignored", key, v);
            None
        }
        Err(_) => {
            warn!("Unparsable {} value: {}", key, raw);
            None
        }
    }
}
