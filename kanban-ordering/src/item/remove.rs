//! RemoveItem command

use super::{believed_position, pin_item};
use crate::context::OrderingContext;
use crate::error::{OrderingError, Result};
use crate::operation::{logged, operation, Execute, ExecutionResult, Mutation};
use crate::plan::plan_remove;
use crate::types::ItemId;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// Remove an item and close the gap it leaves behind
#[derive(Debug, Deserialize, Serialize)]
pub struct RemoveItem {
    pub id: ItemId,
    /// Position the caller believes the item is at; checked when present
    #[serde(default)]
    pub expected_position: Option<usize>,
}

operation!(
    RemoveItem,
    verb = "remove",
    noun = "item",
    description = "Remove an item and renumber the siblings after it"
);

impl RemoveItem {
    pub fn new(id: impl Into<ItemId>) -> Self {
        Self {
            id: id.into(),
            expected_position: None,
        }
    }

    pub fn from_position(mut self, position: usize) -> Self {
        self.expected_position = Some(position);
        self
    }

    async fn run(&self, ctx: &OrderingContext) -> Result<Mutation> {
        let (_guard, item) = pin_item(ctx, &self.id, None).await?;
        let siblings = ctx.read_items(&item.container_id).await?;
        let plan = plan_remove(
            &item.container_id,
            &siblings,
            &item.id,
            believed_position(&item, self.expected_position),
        )?;

        ctx.store().apply(&plan).await?;
        tracing::info!(item = %item.id, container = %item.container_id,
            position = item.position, shifted = plan.shifts.len(), "item removed");

        Ok(Mutation::Applied(json!({
            "removed": item,
            "shifted": plan.shifts.len(),
        })))
    }
}

#[async_trait]
impl Execute<OrderingContext, OrderingError> for RemoveItem {
    async fn execute(&self, ctx: &OrderingContext) -> ExecutionResult<Value, OrderingError> {
        logged(self, self.run(ctx)).await
    }
}
