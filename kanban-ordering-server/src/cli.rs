//! Command line definition

use clap::{Args, Parser, Subcommand};
use std::net::SocketAddr;
use std::path::PathBuf;

/// Kanban ordering server
///
/// Keeps card and column positions dense across inserts, removals and moves.
#[derive(Parser, Debug)]
#[command(name = "kanban-ordering")]
#[command(version)]
#[command(about = "Dense ordering service for kanban cards and columns")]
pub struct Cli {
    /// Enable debug output to stderr
    #[arg(short, long, global = true)]
    pub debug: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the HTTP server
    Serve(ServeArgs),
    /// Print the effective configuration and exit
    Config(ServeArgs),
}

#[derive(Args, Debug, Default)]
pub struct ServeArgs {
    /// Config file (TOML, YAML or JSON)
    #[arg(short, long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Address to listen on
    #[arg(short, long, value_name = "ADDR")]
    pub bind: Option<SocketAddr>,

    /// SQLite file, or `:memory:`
    #[arg(long, value_name = "PATH")]
    pub database: Option<String>,

    /// Milliseconds a command waits for its container locks
    #[arg(long, value_name = "MS")]
    pub lock_timeout_ms: Option<u64>,

    /// JSONL file receiving one line per logged command
    #[arg(long, value_name = "PATH")]
    pub activity_log: Option<PathBuf>,
}

impl ServeArgs {
    /// Load the layered config and apply the flags given on the command line
    pub fn resolve(&self) -> Result<crate::ServerConfig, crate::ConfigError> {
        let mut figment = crate::ServerConfig::figment(self.config.as_deref())?;

        if let Some(bind) = self.bind {
            figment = figment.merge(("bind", bind));
        }
        if let Some(database) = &self.database {
            figment = figment.merge(("database", database));
        }
        if let Some(ms) = self.lock_timeout_ms {
            figment = figment.merge(("lock_timeout_ms", ms));
        }
        if let Some(path) = &self.activity_log {
            figment = figment.merge(("activity_log", path));
        }

        Ok(figment.extract()?)
    }
}
