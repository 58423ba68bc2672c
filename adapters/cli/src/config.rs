//! Optional TOML configuration merged under the command-line flags.

use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use serde::Deserialize;

/// Settings of a play session.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub(crate) struct Config {
    /// Save file location.
    pub(crate) save_path: PathBuf,
    /// Whether a snapshot is written after every processed line.
    pub(crate) autosave: bool,
    /// `env_logger` filter.
    pub(crate) log_level: String,
    /// Simulated milliseconds advanced per processed line.
    pub(crate) tick_ms: u64,
    /// File to read input lines from instead of stdin.
    pub(crate) script: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            save_path: PathBuf::from("medusa-tower.save"),
            autosave: true,
            log_level: "warn".to_owned(),
            tick_ms: 100,
            script: None,
        }
    }
}

impl Config {
    /// Loads the file at `path`, or the defaults when `path` is `None`.
    pub(crate) fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let content = fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        Self::parse(&content)
            .with_context(|| format!("failed to parse config file {}", path.display()))
    }

    fn parse(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }
}
