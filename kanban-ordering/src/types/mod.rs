//! Core types for the ordering engine

mod board;
mod ids;
mod log;

// Re-export all types
pub use board::{Container, ContainerKind, Item, ItemKind};
pub use ids::{ContainerId, ItemId, LogEntryId};
pub use log::LogEntry;
