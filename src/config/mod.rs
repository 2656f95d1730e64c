//! Configuration management for edumon
//!
//! Configuration is read from a TOML file (`config.toml` by default) and
//! then overridden by `EDUMON_*` environment variables.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::allocation::LevelLimits;
use crate::api::config::ServerConfig;
use crate::models::Level;

/// Default config file looked up in the working directory
pub const DEFAULT_CONFIG_FILE: &str = "config.toml";

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// HTTP server configuration
    pub server: ServerConfig,

    /// Database configuration
    pub database: DatabaseConfig,

    /// Logging configuration
    pub logging: LoggingConfig,

    /// Student-count allocation configuration
    pub allocation: AllocationConfig,
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// SQLite database path
    pub sqlite_path: PathBuf,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            sqlite_path: PathBuf::from("data/edumon.db"),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,

    /// Log format (text, json)
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: String::from("info"),
            format: String::from("text"),
        }
    }
}

/// Allocation configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AllocationConfig {
    /// Fixed RNG seed for reproducible distribution runs
    pub seed: Option<u64>,

    /// Per-level share limits
    pub levels: LevelLimitsConfig,
}

/// Share limits for every level
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LevelLimitsConfig {
    pub sd: LevelLimits,
    pub smp: LevelLimits,
    pub sma: LevelLimits,
    pub smk: LevelLimits,
    pub slb: LevelLimits,
}

impl Default for LevelLimitsConfig {
    fn default() -> Self {
        Self {
            sd: LevelLimits::for_level(Level::Sd),
            smp: LevelLimits::for_level(Level::Smp),
            sma: LevelLimits::for_level(Level::Sma),
            smk: LevelLimits::for_level(Level::Smk),
            slb: LevelLimits::for_level(Level::Slb),
        }
    }
}

impl LevelLimitsConfig {
    /// Limits configured for a level
    pub fn for_level(&self, level: Level) -> LevelLimits {
        match level {
            Level::Sd => self.sd,
            Level::Smp => self.smp,
            Level::Sma => self.sma,
            Level::Smk => self.smk,
            Level::Slb => self.slb,
        }
    }
}

impl Config {
    /// Load configuration from environment variables on top of defaults
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();
        config.apply_env()?;
        Ok(config)
    }

    /// Load configuration from a file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Self = toml::from_str(&content)
            .with_context(|| format!("Failed to parse TOML config file: {}", path.display()))?;

        Ok(config)
    }

    /// Load from an explicit file, else `config.toml` when present, else
    /// defaults; environment variables win in every case
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None if Path::new(DEFAULT_CONFIG_FILE).exists() => {
                Self::from_file(Path::new(DEFAULT_CONFIG_FILE))?
            }
            None => Self::default(),
        };

        config.apply_env()?;
        config.validate()?;
        Ok(config)
    }

    /// Override values from `EDUMON_*` environment variables
    pub fn apply_env(&mut self) -> Result<()> {
        if let Ok(path) = std::env::var("EDUMON_SQLITE_PATH") {
            self.database.sqlite_path = PathBuf::from(path);
        }

        if let Ok(addr) = std::env::var("EDUMON_BIND_ADDRESS") {
            self.server.bind_address = addr
                .parse()
                .with_context(|| format!("Invalid EDUMON_BIND_ADDRESS: {addr}"))?;
        } else if let Some(port) = std::env::var("PORT").ok().and_then(|p| p.parse::<u16>().ok()) {
            self.server.bind_address.set_port(port);
        }

        if let Ok(level) = std::env::var("EDUMON_LOG_LEVEL") {
            self.logging.level = level;
        }

        if let Ok(format) = std::env::var("EDUMON_LOG_FORMAT") {
            self.logging.format = format;
        }

        if let Ok(seed) = std::env::var("EDUMON_ALLOCATION_SEED") {
            self.allocation.seed = Some(
                seed.parse()
                    .with_context(|| format!("Invalid EDUMON_ALLOCATION_SEED: {seed}"))?,
            );
        }

        Ok(())
    }

    /// Apply a command-line log format and re-validate
    pub fn override_log_format(&mut self, format: Option<String>) -> Result<()> {
        if let Some(format) = format {
            self.logging.format = format;
            self.validate()?;
        }
        Ok(())
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        self.server.validate()?;

        if !matches!(self.logging.format.as_str(), "text" | "json") {
            anyhow::bail!("logging.format must be 'text' or 'json'");
        }

        for level in Level::ALL {
            self.allocation
                .levels
                .for_level(level)
                .validate()
                .map_err(|reason| anyhow::anyhow!("allocation.levels.{level}: {reason}"))?;
        }

        Ok(())
    }
}
