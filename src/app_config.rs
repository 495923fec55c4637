use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::database::dialect::Dialect;
use crate::database::models::{TableNames, DEFAULT_MESSAGE_TABLE, DEFAULT_SOURCE_MESSAGE_TABLE};

/// Application configuration module
/// This module handles loading, validating and saving the settings of the
/// message store: which database to open, how the catalog tables are named,
/// and how reads are cached.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Config {
    /// Database connection settings
    #[serde(default)]
    pub database: DatabaseConfig,

    /// Catalog table naming
    #[serde(default)]
    pub tables: TableConfig,

    /// External cache settings
    #[serde(default)]
    pub cache: CacheConfig,

    /// Run every write in its own transaction
    #[serde(default = "default_true")]
    pub transactional_writes: bool,

    /// Log level
    #[serde(default)]
    pub log_level: LogLevel,
}

/// Database connection settings
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct DatabaseConfig {
    /// Driver name. Only `sqlite` can be opened by the CLI, the other
    /// dialects are available for script rendering.
    #[serde(default = "default_driver")]
    pub driver: String,

    /// Database file, the user data directory when absent
    #[serde(default)]
    pub path: Option<PathBuf>,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            driver: default_driver(),
            path: None,
        }
    }
}

/// Catalog table naming. Names may use the `{{%name}}` notation.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct TableConfig {
    /// Replaces `%` in `{{%name}}` table names
    #[serde(default)]
    pub prefix: String,

    /// Source message table
    #[serde(default = "default_source_message_table")]
    pub source_message: String,

    /// Translation table
    #[serde(default = "default_message_table")]
    pub message: String,
}

impl Default for TableConfig {
    fn default() -> Self {
        Self {
            prefix: String::new(),
            source_message: default_source_message_table(),
            message: default_message_table(),
        }
    }
}

/// External cache settings
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct CacheConfig {
    /// Put an in-memory cache in front of database reads
    #[serde(default)]
    pub enabled: bool,

    /// Lifetime of cached catalogs in seconds
    #[serde(default = "default_cache_duration_secs")]
    pub duration_secs: u64,
}

impl CacheConfig {
    /// Lifetime of cached catalogs
    pub fn duration(&self) -> Duration {
        Duration::from_secs(self.duration_secs)
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            duration_secs: default_cache_duration_secs(),
        }
    }
}

/// Log verbosity level
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    /// Matching `log` filter
    pub fn to_level_filter(self) -> log::LevelFilter {
        match self {
            Self::Error => log::LevelFilter::Error,
            Self::Warn => log::LevelFilter::Warn,
            Self::Info => log::LevelFilter::Info,
            Self::Debug => log::LevelFilter::Debug,
            Self::Trace => log::LevelFilter::Trace,
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_driver() -> String {
    Dialect::Sqlite.driver_name().to_string()
}

fn default_source_message_table() -> String {
    format!("{{{{%{}}}}}", DEFAULT_SOURCE_MESSAGE_TABLE)
}

fn default_message_table() -> String {
    format!("{{{{%{}}}}}", DEFAULT_MESSAGE_TABLE)
}

fn default_cache_duration_secs() -> u64 {
    3600
}

impl Config {
    /// Load a configuration file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path)
            .with_context(|| format!("Failed to open config file: {:?}", path))?;

        let reader = BufReader::new(file);
        let config: Config = serde_json::from_reader(reader)
            .with_context(|| format!("Failed to parse config file: {:?}", path))?;

        Ok(config)
    }

    /// Write the configuration as pretty JSON
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let json = serde_json::to_string_pretty(self)
            .context("Failed to serialize config to JSON")?;

        std::fs::write(path, json)
            .with_context(|| format!("Failed to write config to file: {:?}", path))?;

        Ok(())
    }

    /// Validate the configuration for consistency and required values
    pub fn validate(&self) -> Result<()> {
        self.dialect()?;
        self.table_names()?;

        if self.cache.enabled && self.cache.duration_secs == 0 {
            return Err(anyhow!("Cache duration must be positive when the cache is enabled"));
        }

        Ok(())
    }

    /// Configured dialect
    pub fn dialect(&self) -> Result<Dialect> {
        Ok(Dialect::from_driver_name(&self.database.driver)?)
    }

    /// Resolved and validated table names
    pub fn table_names(&self) -> Result<TableNames> {
        Ok(TableNames::new(
            &self.tables.source_message,
            &self.tables.message,
            &self.tables.prefix,
        )?)
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            database: DatabaseConfig::default(),
            tables: TableConfig::default(),
            cache: CacheConfig::default(),
            transactional_writes: true,
            log_level: LogLevel::default(),
        }
    }
}
