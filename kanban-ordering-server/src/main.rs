//! kanban-ordering - serve dense kanban ordering over HTTP
//!
//! Commands:
//! - `kanban-ordering serve`: run the HTTP server until Ctrl-C
//! - `kanban-ordering config`: print the effective configuration

use clap::Parser;
use kanban_ordering_server::{serve, Cli, Commands};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.debug {
        EnvFilter::new("kanban_ordering=debug,kanban_ordering_server=debug,tower_http=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Serve(args) => {
            let config = args.resolve()?;
            serve(&config, shutdown_signal()).await
        }
        Commands::Config(args) => {
            let config = args.resolve()?;
            println!("{}", serde_json::to_string_pretty(&config)?);
            Ok(())
        }
    }
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => tracing::info!("received Ctrl-C, shutting down"),
        Err(e) => tracing::error!("failed to listen for Ctrl-C: {}", e),
    }
}
