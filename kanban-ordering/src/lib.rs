//! Dense per-container ordering for kanban boards
//!
//! Every movable item (a card inside a column, a column inside a board) carries an integer
//! `position`. Within one container those positions are always exactly `0..n`: no gaps, no
//! duplicates. This crate keeps that true under insert, remove, and move, including moves
//! between two containers.
//!
//! ## Overview
//!
//! - **Planning is pure** - [`plan`] turns a sibling list plus a request into a
//!   [`ReorderPlan`] of position shifts, with no I/O
//! - **Applying is atomic** - an [`OrderingStore`] applies a whole plan or none of it
//! - **Containers are serialized** - [`ContainerLocks`] lets only one reorder touch a
//!   container at a time
//! - **Commands are audited** - every mutation produces a [`LogEntry`]
//!
//! ## Basic Usage
//!
//! ```rust,no_run
//! use kanban_ordering::{
//!     container::AddContainer, item::{InsertAtEnd, MoveWithinContainer},
//!     ContainerKind, Execute, MemoryStore, OrderingContext,
//! };
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let ctx = OrderingContext::new(Arc::new(MemoryStore::new()));
//!
//! let column = AddContainer::new("todo", ContainerKind::Column, "To Do")
//!     .execute(&ctx).await.into_result()?;
//! let card = InsertAtEnd::card("todo", "Write docs")
//!     .execute(&ctx).await.into_result()?;
//!
//! MoveWithinContainer::new(card["id"].as_str().unwrap(), 0)
//!     .execute(&ctx).await.into_result()?;
//! # let _ = column;
//! # Ok(())
//! # }
//! ```

mod context;
mod error;
mod lock;
mod operation;
pub mod plan;
mod processor;
pub mod store;
pub mod types;

// Command modules
pub mod container;
pub mod item;

pub use context::OrderingContext;
pub use error::{OrderingError, Result};
pub use lock::{ContainerGuard, ContainerLocks, DEFAULT_LOCK_TIMEOUT};
pub use operation::{Execute, ExecutionResult, Operation};
pub use plan::{Placement, ReorderPlan, Shift};
pub use processor::OrderingProcessor;
pub use store::{MemoryStore, OrderingStore, SqliteStore};

// Re-export commonly used types
pub use types::{Container, ContainerId, ContainerKind, Item, ItemId, ItemKind, LogEntry};

pub use async_trait::async_trait;
