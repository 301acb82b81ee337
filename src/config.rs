//! Configuration management for beaconfield

use crate::error::{EngineError, Result};
use crate::faction::FactionRoster;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::ErrorKind;
use std::path::Path;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub engine: EngineConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
}

/// Tunables supplied to [`Engine::new`](crate::engine::Engine::new).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    #[serde(default = "default_max_links")]
    pub max_links_per_beacon: usize,
    /// Refuse a field when it and an enemy field contain each other's vertices.
    #[serde(default = "default_enabled")]
    pub reject_enemy_overlap: bool,
    /// Refuse a field when one of its sides crosses an enemy link.
    #[serde(default = "default_enabled")]
    pub reject_enemy_crossings: bool,
    #[serde(default = "default_factions")]
    pub factions: Vec<String>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_links_per_beacon: default_max_links(),
            reject_enemy_overlap: true,
            reject_enemy_crossings: true,
            factions: default_factions(),
        }
    }
}

impl EngineConfig {
    pub fn validate(&self) -> Result<()> {
        if self.max_links_per_beacon == 0 {
            return Err(EngineError::ConfigError(
                "engine.max_links_per_beacon must be at least 1".to_string(),
            ));
        }
        if self.factions.is_empty() {
            return Err(EngineError::ConfigError(
                "engine.factions must name at least one faction".to_string(),
            ));
        }
        self.roster().map(|_| ())
    }

    pub fn roster(&self) -> Result<FactionRoster> {
        FactionRoster::new(self.factions.iter().cloned())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_db_path")]
    pub path: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
        }
    }
}

fn default_max_links() -> usize {
    8
}

fn default_enabled() -> bool {
    true
}

fn default_factions() -> Vec<String> {
    vec!["red".to_string(), "blue".to_string()]
}

fn default_db_path() -> String {
    "./beaconfield.db".to_string()
}

/// Parses and validates a TOML document.
pub fn parse_config(config_str: &str) -> Result<Config> {
    let config: Config = toml::from_str(config_str)?;
    validate(&config)?;
    Ok(config)
}

/// Loads the config at `path`, falling back to defaults when the file is absent.
pub fn load_config(path: impl AsRef<Path>) -> Result<Config> {
    match fs::read_to_string(path.as_ref()) {
        Ok(config_str) => parse_config(&config_str),
        Err(e) if e.kind() == ErrorKind::NotFound => {
            tracing::debug!(path = %path.as_ref().display(), "config file absent, using defaults");
            let config = Config::default();
            validate(&config)?;
            Ok(config)
        }
        Err(e) => Err(e.into()),
    }
}

fn validate(config: &Config) -> Result<()> {
    config.engine.validate()?;
    if config.database.path.is_empty() {
        return Err(EngineError::ConfigError(
            "database.path must be set".to_string(),
        ));
    }
    Ok(())
}
