//! InsertAtEnd command

use crate::context::OrderingContext;
use crate::error::{OrderingError, Result};
use crate::operation::{logged, operation, Execute, ExecutionResult, Mutation};
use crate::plan::plan_insert_at_end;
use crate::types::{ContainerId, Item, ItemId, ItemKind};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Append a new item to the end of a container
#[derive(Debug, Deserialize, Serialize)]
pub struct InsertAtEnd {
    /// The container to append to
    pub container: ContainerId,
    /// Item ID; minted when absent
    #[serde(default)]
    pub id: Option<ItemId>,
    /// Display title
    pub title: String,
    /// Item kind; defaults to whatever the container holds
    #[serde(default)]
    pub kind: Option<ItemKind>,
}

operation!(
    InsertAtEnd,
    verb = "insert",
    noun = "item",
    description = "Append a new item at the end of a container"
);

impl InsertAtEnd {
    pub fn new(container: impl Into<ContainerId>, title: impl Into<String>) -> Self {
        Self {
            container: container.into(),
            id: None,
            title: title.into(),
            kind: None,
        }
    }

    /// Append a card to a column
    pub fn card(column: impl Into<ContainerId>, title: impl Into<String>) -> Self {
        Self::new(column, title).with_kind(ItemKind::Card)
    }

    /// Append a column to a board
    pub fn column(board: impl Into<ContainerId>, title: impl Into<String>) -> Self {
        Self::new(board, title).with_kind(ItemKind::Column)
    }

    pub fn with_id(mut self, id: impl Into<ItemId>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_kind(mut self, kind: ItemKind) -> Self {
        self.kind = Some(kind);
        self
    }

    async fn run(&self, ctx: &OrderingContext) -> Result<Mutation> {
        if self.title.trim().is_empty() {
            return Err(OrderingError::invalid_value("title", "must not be empty"));
        }

        let container = ctx.read_container(&self.container).await?;
        let kind = self.kind.unwrap_or(container.kind.item_kind());
        if !container.accepts(kind) {
            return Err(OrderingError::KindMismatch {
                container: container.id.to_string(),
                container_kind: container.kind.to_string(),
                item_kind: kind.to_string(),
            });
        }

        let id = self.id.clone().unwrap_or_default();
        let item = Item::new(id.clone(), container.id.clone(), kind, self.title.clone());

        let _guard = ctx.lock(&[container.id.clone()]).await?;
        let siblings = ctx.read_items(&container.id).await?;
        let plan = plan_insert_at_end(&container.id, &siblings, item)?;
        ctx.store().apply(&plan).await?;

        let inserted = ctx.read_item(&id).await?;
        tracing::info!(item = %inserted.id, container = %container.id,
            position = inserted.position, "item inserted");
        Ok(Mutation::Applied(serde_json::to_value(&inserted)?))
    }
}

#[async_trait]
impl Execute<OrderingContext, OrderingError> for InsertAtEnd {
    async fn execute(&self, ctx: &OrderingContext) -> ExecutionResult<Value, OrderingError> {
        logged(self, self.run(ctx)).await
    }
}
