//! HTTP server and CLI for the kanban ordering engine
//!
//! Wires a [`ServerConfig`] into an [`OrderingContext`] and serves the JSON routes in
//! [`http`] until a shutdown signal arrives.

pub mod cli;
pub mod config;
pub mod error;
pub mod http;

pub use cli::{Cli, Commands, ServeArgs};
pub use config::{ConfigError, Database, ServerConfig};
pub use error::ApiError;
pub use http::{router, AppState};

use kanban_ordering::{MemoryStore, OrderingContext, OrderingStore, SqliteStore};
use std::future::Future;
use std::sync::Arc;
use tokio::net::TcpListener;

/// Open the configured store and wrap it in a context
pub fn build_context(config: &ServerConfig) -> kanban_ordering::Result<OrderingContext> {
    let store: Arc<dyn OrderingStore> = match &config.database {
        config::Database::Memory => Arc::new(MemoryStore::new()),
        config::Database::Sqlite(path) => Arc::new(SqliteStore::open(path)?),
    };
    tracing::info!(store = store.name(), "opened ordering store");

    let mut ctx = OrderingContext::new(store).with_lock_timeout(config.lock_timeout());
    if let Some(path) = &config.activity_log {
        ctx = ctx.with_activity_log(path);
    }
    Ok(ctx)
}

/// Bind the configured address and serve until `shutdown` resolves
pub async fn serve(
    config: &ServerConfig,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> anyhow::Result<()> {
    let ctx = Arc::new(build_context(config)?);
    let app = router(ctx);

    let listener = TcpListener::bind(config.bind).await?;
    tracing::info!("kanban ordering server listening on http://{}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await?;

    tracing::info!("kanban ordering server stopped");
    Ok(())
}
