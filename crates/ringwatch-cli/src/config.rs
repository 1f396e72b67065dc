//! Configuration management for the ringwatch CLI.

use anyhow::{Context, Result};
use ringwatch::prelude::{standard_plant, PlantConfig};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const CONFIG_FILE: &str = "ringwatch.toml";
pub const DATA_DIR: &str = ".ringwatch";

/// Ringwatch project configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default = "standard_plant")]
    pub plant: PlantConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// SQLite database, relative to the project root unless absolute.
    #[serde(default = "default_database")]
    pub database: String,
    /// Name recorded in the audit trail when `--actor` is not given.
    #[serde(default = "default_actor")]
    pub actor: String,
}

fn default_database() -> String { format!("{}/ringwatch.db", DATA_DIR) }
fn default_actor() -> String { "operator".to_string() }

impl Default for Config {
    fn default() -> Self {
        Self {
            storage: StorageConfig::default(),
            plant: standard_plant(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database: default_database(),
            actor: default_actor(),
        }
    }
}

impl Config {
    /// Load config from ringwatch.toml in the current or parent directories.
    pub fn load() -> Result<Self> {
        if let Some(path) = find_config_file() {
            Self::load_from(&path)
        } else {
            Ok(Config::default())
        }
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config: {}", path.display()))?;
        toml::from_str(&content)
            .with_context(|| format!("Failed to parse config: {}", path.display()))
    }

    /// Save config to the specified path.
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .context("Failed to serialize config")?;
        std::fs::write(path, content)
            .with_context(|| format!("Failed to write config: {}", path.display()))?;
        Ok(())
    }

    /// Absolute path of the snapshot database.
    pub fn database_path(&self) -> Result<PathBuf> {
        let path = Path::new(&self.storage.database);
        if path.is_absolute() {
            Ok(path.to_path_buf())
        } else {
            Ok(project_root()?.join(path))
        }
    }
}

/// Find ringwatch.toml in current or parent directories.
fn find_config_file() -> Option<PathBuf> {
    let mut dir = std::env::current_dir().ok()?;
    loop {
        let config_path = dir.join(CONFIG_FILE);
        if config_path.exists() {
            return Some(config_path);
        }
        if !dir.pop() {
            break;
        }
    }
    None
}

/// Directory holding ringwatch.toml, or the current directory.
pub fn project_root() -> Result<PathBuf> {
    match find_config_file().and_then(|p| p.parent().map(Path::to_path_buf)) {
        Some(root) => Ok(root),
        None => Ok(std::env::current_dir()?),
    }
}

/// Path of ringwatch.toml for the current project.
pub fn config_path() -> Result<PathBuf> {
    Ok(project_root()?.join(CONFIG_FILE))
}

/// Get the ringwatch data directory (.ringwatch/).
pub fn data_dir() -> Result<PathBuf> {
    Ok(project_root()?.join(DATA_DIR))
}

/// Get the working topology file path.
pub fn current_session_path() -> Result<PathBuf> {
    Ok(data_dir()?.join("current.json"))
}
