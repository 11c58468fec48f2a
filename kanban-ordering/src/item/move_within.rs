//! MoveWithinContainer command

use super::{believed_position, pin_item};
use crate::context::OrderingContext;
use crate::error::{OrderingError, Result};
use crate::operation::{logged, operation, Execute, ExecutionResult, Mutation};
use crate::plan::plan_move_within;
use crate::types::{ContainerId, ItemId};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Move an item to another slot in the container it already lives in
#[derive(Debug, Deserialize, Serialize)]
pub struct MoveWithinContainer {
    /// The item to move
    pub id: ItemId,
    /// Target position, `0..n`
    pub position: usize,
    /// Container the caller believes the item is in; checked when present
    #[serde(default)]
    pub container: Option<ContainerId>,
    /// Position the caller believes the item is at; checked when present
    #[serde(default)]
    pub expected_position: Option<usize>,
}

operation!(
    MoveWithinContainer,
    verb = "reorder",
    noun = "item",
    description = "Move an item to a new position inside its container"
);

impl MoveWithinContainer {
    pub fn new(id: impl Into<ItemId>, position: usize) -> Self {
        Self {
            id: id.into(),
            position,
            container: None,
            expected_position: None,
        }
    }

    /// Require the item to be in `container`
    pub fn in_container(mut self, container: impl Into<ContainerId>) -> Self {
        self.container = Some(container.into());
        self
    }

    /// Require the item to currently be at `position`
    pub fn from_position(mut self, position: usize) -> Self {
        self.expected_position = Some(position);
        self
    }

    async fn run(&self, ctx: &OrderingContext) -> Result<Mutation> {
        let (_guard, item) = pin_item(ctx, &self.id, None).await?;

        if let Some(container) = &self.container {
            if *container != item.container_id {
                return Err(OrderingError::invalid_value(
                    "container",
                    format!("item '{}' is in '{}', not '{}'", item.id, item.container_id, container),
                ));
            }
        }

        let siblings = ctx.read_items(&item.container_id).await?;
        let plan = plan_move_within(
            &item.container_id,
            &siblings,
            &item.id,
            believed_position(&item, self.expected_position),
            self.position,
        )?;

        if plan.is_noop() {
            tracing::debug!(item = %item.id, position = item.position, "move is a no-op");
            return Ok(Mutation::Unchanged(serde_json::to_value(&item)?));
        }

        ctx.store().apply(&plan).await?;
        let moved = ctx.read_item(&item.id).await?;
        tracing::info!(item = %moved.id, container = %moved.container_id, from = item.position,
            to = moved.position, shifted = plan.shifts.len(), "item reordered");
        Ok(Mutation::Applied(serde_json::to_value(&moved)?))
    }
}

#[async_trait]
impl Execute<OrderingContext, OrderingError> for MoveWithinContainer {
    async fn execute(&self, ctx: &OrderingContext) -> ExecutionResult<Value, OrderingError> {
        logged(self, self.run(ctx)).await
    }
}
