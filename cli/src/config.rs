//! Configuration file handling.
//!
//! The file is YAML with two optional sections:
//!
//! ```yaml
//! pipeline:
//!   max_buffer_secs: 20
//!   alert:
//!     cooldown_secs: 30
//! store:
//!   path: /var/lib/sentinel/sentinel.redb
//! ```
//!
//! A missing file means defaults everywhere.

use std::path::{Path, PathBuf};

use anyhow::Context as _;
use sentinel_session::PipelineConfig;
use serde::{Deserialize, Serialize};

use crate::Paths;

/// Where call records and voiceprints are kept.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StoreConfig {
    /// redb database file. Defaults to `~/.sentinel/sentinel.redb`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
}

/// CLI configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub pipeline: PipelineConfig,

    #[serde(default)]
    pub store: StoreConfig,

    /// Path the configuration was read from (not serialized).
    #[serde(skip)]
    config_path: PathBuf,

    #[serde(skip)]
    paths: Option<Paths>,
}

impl Config {
    /// Returns the config file path.
    pub fn path(&self) -> &Path {
        &self.config_path
    }

    /// Resolves the database path. Relative paths are taken relative to the
    /// directory holding the config file.
    pub fn store_path(&self) -> anyhow::Result<PathBuf> {
        match &self.store.path {
            Some(p) if p.is_absolute() => Ok(p.clone()),
            Some(p) => Ok(self
                .config_path
                .parent()
                .map(|dir| dir.join(p))
                .unwrap_or_else(|| p.clone())),
            None => match &self.paths {
                Some(paths) => Ok(paths.store_file()),
                None => Ok(Paths::new().context("cannot determine store path")?.store_file()),
            },
        }
    }

    /// Writes the configuration back to its file.
    pub fn save(&self) -> anyhow::Result<()> {
        if let Some(parent) = self.config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = serde_yaml::to_string(self)?;
        std::fs::write(&self.config_path, content)
            .with_context(|| format!("writing {}", self.config_path.display()))?;
        Ok(())
    }
}

/// Loads the configuration from `custom_path`, or `~/.sentinel/config.yaml`.
pub fn load_config(custom_path: Option<&Path>) -> anyhow::Result<Config> {
    match custom_path {
        Some(p) => load_from(p, None),
        None => {
            let paths = Paths::new().context("cannot determine config path")?;
            load_from(&paths.config_file(), Some(paths))
        }
    }
}

fn load_from(config_path: &Path, paths: Option<Paths>) -> anyhow::Result<Config> {
    let mut cfg: Config = if config_path.exists() {
        let content = std::fs::read_to_string(config_path)
            .with_context(|| format!("reading {}", config_path.display()))?;
        if content.trim().is_empty() {
            Config::default()
        } else {
            serde_yaml::from_str(&content).with_context(|| format!("parsing {}", config_path.display()))?
        }
    } else {
        Config::default()
    };

    cfg.config_path = config_path.to_path_buf();
    cfg.paths = paths;
    Ok(cfg)
}
