//! Persistence for containers and their ordered items
//!
//! A store reads rows and applies [`ReorderPlan`]s. It never decides positions itself; it
//! only guarantees that a plan lands all at once or not at all.

mod memory;
mod sqlite;

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

use crate::error::{OrderingError, Result};
use crate::plan::ReorderPlan;
use crate::types::{Container, ContainerId, Item, ItemId};
use async_trait::async_trait;

/// Backing storage for the ordering engine
#[async_trait]
pub trait OrderingStore: Send + Sync {
    /// Short backend name for logs
    fn name(&self) -> &'static str;

    /// Register a new container
    async fn create_container(&self, container: &Container) -> Result<()>;

    /// Look up a container
    async fn get_container(&self, id: &ContainerId) -> Result<Container>;

    /// All containers, sorted by id
    async fn list_containers(&self) -> Result<Vec<Container>>;

    /// Items of a container ordered by position, then id
    async fn list_items(&self, container: &ContainerId) -> Result<Vec<Item>>;

    /// Look up an item
    async fn get_item(&self, id: &ItemId) -> Result<Item>;

    /// Apply every change in `plan` atomically
    ///
    /// Each shift and the placement carry the position the planner saw. If any stored row
    /// no longer matches, nothing is written and a `Conflict` is returned.
    async fn apply(&self, plan: &ReorderPlan) -> Result<()>;
}

/// Build the error for a row that did not match what the plan expected
pub(crate) fn stale(item: &ItemId, expected: usize, actual: Option<usize>) -> OrderingError {
    match actual {
        Some(actual) => OrderingError::Conflict {
            item: item.to_string(),
            expected,
            actual,
        },
        None => OrderingError::item_not_found(item),
    }
}
