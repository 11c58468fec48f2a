//! OrderingContext - access primitives shared by every command
//!
//! The context hands out the store, the container locks and the activity log. It holds no
//! ordering logic; commands and the planner do all the work.

use crate::error::Result;
use crate::lock::{ContainerGuard, ContainerLocks, DEFAULT_LOCK_TIMEOUT};
use crate::store::OrderingStore;
use crate::types::{Container, ContainerId, Item, ItemId, LogEntry};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::fs;
use tokio::io::AsyncWriteExt;

/// Context passed to every command - provides access, not logic
pub struct OrderingContext {
    store: Arc<dyn OrderingStore>,
    locks: ContainerLocks,
    lock_timeout: Duration,
    activity_log: Option<PathBuf>,
}

impl OrderingContext {
    /// Create a new context over a store
    pub fn new(store: Arc<dyn OrderingStore>) -> Self {
        Self {
            store,
            locks: ContainerLocks::new(),
            lock_timeout: DEFAULT_LOCK_TIMEOUT,
            activity_log: None,
        }
    }

    /// Set how long a command waits for its container locks
    pub fn with_lock_timeout(mut self, timeout: Duration) -> Self {
        self.lock_timeout = timeout;
        self
    }

    /// Append every logged command to a JSONL file
    pub fn with_activity_log(mut self, path: impl Into<PathBuf>) -> Self {
        self.activity_log = Some(path.into());
        self
    }

    pub fn store(&self) -> &dyn OrderingStore {
        self.store.as_ref()
    }

    pub fn lock_timeout(&self) -> Duration {
        self.lock_timeout
    }

    pub fn activity_log_path(&self) -> Option<&Path> {
        self.activity_log.as_deref()
    }

    // =========================================================================
    // Reads
    // =========================================================================

    pub async fn read_container(&self, id: &ContainerId) -> Result<Container> {
        self.store.get_container(id).await
    }

    pub async fn read_items(&self, container: &ContainerId) -> Result<Vec<Item>> {
        self.store.list_items(container).await
    }

    pub async fn read_item(&self, id: &ItemId) -> Result<Item> {
        self.store.get_item(id).await
    }

    // =========================================================================
    // Locking
    // =========================================================================

    /// Serialize against every other command touching any of `containers`
    pub async fn lock(&self, containers: &[ContainerId]) -> Result<ContainerGuard> {
        self.locks.acquire(containers, self.lock_timeout).await
    }

    // =========================================================================
    // Activity logging
    // =========================================================================

    /// Append a log entry to the activity log, if one is configured
    pub async fn append_activity(&self, entry: &LogEntry) -> Result<()> {
        let Some(path) = &self.activity_log else {
            return Ok(());
        };

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).await?;
            }
        }

        let mut line = serde_json::to_string(entry)?;
        line.push('\n');

        let mut file = fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .await?;

        file.write_all(line.as_bytes()).await?;
        file.flush().await?;

        Ok(())
    }

    /// Read activity log entries, newest first
    pub async fn read_activity(&self, limit: Option<usize>) -> Result<Vec<LogEntry>> {
        let Some(path) = &self.activity_log else {
            return Ok(Vec::new());
        };
        if !path.exists() {
            return Ok(Vec::new());
        }

        let content = fs::read_to_string(path).await?;
        let mut entries: Vec<LogEntry> = content
            .lines()
            .filter(|line| !line.is_empty())
            .filter_map(|line| serde_json::from_str(line).ok())
            .collect();

        entries.reverse();

        if let Some(limit) = limit {
            entries.truncate(limit);
        }

        Ok(entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use serde_json::json;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_activity_log_roundtrip() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("activity").join("current.jsonl");
        let ctx = OrderingContext::new(Arc::new(MemoryStore::new())).with_activity_log(&path);

        for n in 0..3 {
            let entry = LogEntry::success("move item", json!({ "n": n }), json!({}), 0);
            ctx.append_activity(&entry).await.unwrap();
        }

        let entries = ctx.read_activity(Some(2)).await.unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].input["n"], 2);
        assert_eq!(entries[1].input["n"], 1);
    }

    #[tokio::test]
    async fn test_no_activity_log_is_silent() {
        let ctx = OrderingContext::new(Arc::new(MemoryStore::new()));
        let entry = LogEntry::success("move item", json!({}), json!({}), 0);
        ctx.append_activity(&entry).await.unwrap();
        assert!(ctx.read_activity(None).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_lock_uses_configured_timeout() {
        let ctx = OrderingContext::new(Arc::new(MemoryStore::new()))
            .with_lock_timeout(Duration::from_millis(10));
        assert_eq!(ctx.lock_timeout(), Duration::from_millis(10));

        let todo = ContainerId::from("todo");
        let _held = ctx.lock(&[todo.clone()]).await.unwrap();
        let err = ctx.lock(&[todo]).await.err().unwrap();
        assert!(err.is_retryable());
    }
}
