//! Server configuration loaded with figment
//!
//! Sources merge in precedence order, later ones winning:
//! 1. Built-in defaults
//! 2. An optional config file (TOML, YAML or JSON, picked by extension)
//! 3. Environment variables prefixed `KANBAN_ORDERING_`
//! 4. Command line overrides

use figment::{
    providers::{Env, Format, Json, Serialized, Toml, Yaml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

/// Prefix for environment overrides, e.g. `KANBAN_ORDERING_BIND`
pub const ENV_PREFIX: &str = "KANBAN_ORDERING_";

/// Spelling of the in-memory database in config files and on the command line
pub const MEMORY_DATABASE: &str = ":memory:";

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Configuration file not found
    #[error("Configuration file not found: {path}")]
    FileNotFound { path: PathBuf },

    /// Configuration file format not supported
    #[error("Unsupported configuration file format: {path}")]
    UnsupportedFormat { path: PathBuf },

    /// Configuration parsing failed
    #[error("Failed to parse configuration: {source}")]
    ParseError {
        #[from]
        source: figment::Error,
    },
}

/// Where items are stored
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Database {
    /// Lost on exit
    Memory,
    /// SQLite file, created when missing
    Sqlite(PathBuf),
}

impl From<String> for Database {
    fn from(value: String) -> Self {
        if value.is_empty() || value == MEMORY_DATABASE {
            Database::Memory
        } else {
            Database::Sqlite(PathBuf::from(value))
        }
    }
}

impl From<Database> for String {
    fn from(value: Database) -> Self {
        match value {
            Database::Memory => MEMORY_DATABASE.to_string(),
            Database::Sqlite(path) => path.display().to_string(),
        }
    }
}

/// Everything the server needs to start
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Address the HTTP listener binds to
    pub bind: SocketAddr,
    /// Backing store
    pub database: Database,
    /// How long a command waits for its container locks
    pub lock_timeout_ms: u64,
    /// JSONL file receiving one line per logged command
    #[serde(default)]
    pub activity_log: Option<PathBuf>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: SocketAddr::from(([127, 0, 0, 1], 8080)),
            database: Database::Memory,
            lock_timeout_ms: 5000,
            activity_log: None,
        }
    }
}

impl ServerConfig {
    /// Load from defaults, `file` and the environment
    pub fn load(file: Option<&Path>) -> Result<Self, ConfigError> {
        Ok(Self::figment(file)?.extract()?)
    }

    /// Build the layered figment without extracting it, so callers can merge overrides
    pub fn figment(file: Option<&Path>) -> Result<Figment, ConfigError> {
        let mut figment = Figment::from(Serialized::defaults(ServerConfig::default()));

        if let Some(path) = file {
            debug!("Loading config file: {}", path.display());
            figment = figment.merge(Self::file_provider(path)?);
        }

        Ok(figment.merge(Env::prefixed(ENV_PREFIX)))
    }

    fn file_provider(path: &Path) -> Result<Figment, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::FileNotFound {
                path: path.to_path_buf(),
            });
        }

        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase);

        match extension.as_deref() {
            Some("toml") => Ok(Figment::from(Toml::file(path))),
            Some("yaml") | Some("yml") => Ok(Figment::from(Yaml::file(path))),
            Some("json") => Ok(Figment::from(Json::file(path))),
            _ => Err(ConfigError::UnsupportedFormat {
                path: path.to_path_buf(),
            }),
        }
    }

    pub fn lock_timeout(&self) -> Duration {
        Duration::from_millis(self.lock_timeout_ms)
    }
}
