//! Container commands

mod add;
mod list;
mod list_containers;
mod reindex;
mod verify;

pub use add::AddContainer;
pub use list::ListItems;
pub use list_containers::ListContainers;
pub use reindex::ReindexContainer;
pub use verify::VerifyContainer;
