//! MoveItem command - one entry point for every kind of move

use super::relocate;
use crate::context::OrderingContext;
use crate::error::{OrderingError, Result};
use crate::operation::{logged, operation, Execute, ExecutionResult, Mutation};
use crate::types::{ContainerId, ItemId};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Move an item to `position` in `container`, or in its own container when none is given
///
/// Behaves like [`MoveWithinContainer`](super::MoveWithinContainer) when the target is the
/// item's own container and like [`MoveAcrossContainers`](super::MoveAcrossContainers)
/// otherwise. Accepts the field names board clients send (`column_id`, `order_index`), and a
/// signed position so a negative one is reported as out of range.
#[derive(Debug, Deserialize, Serialize)]
pub struct MoveItem {
    pub id: ItemId,
    /// Target container; defaults to the item's current container
    #[serde(default, alias = "column_id", alias = "container_id")]
    pub container: Option<ContainerId>,
    /// Target position
    #[serde(alias = "order_index", alias = "order")]
    pub position: i64,
    #[serde(default)]
    pub expected_position: Option<usize>,
}

operation!(
    MoveItem,
    verb = "move",
    noun = "item",
    description = "Move an item within or across containers"
);

impl MoveItem {
    pub fn new(id: impl Into<ItemId>, position: i64) -> Self {
        Self {
            id: id.into(),
            container: None,
            position,
            expected_position: None,
        }
    }

    pub fn to_container(mut self, container: impl Into<ContainerId>) -> Self {
        self.container = Some(container.into());
        self
    }

    pub fn from_position(mut self, position: usize) -> Self {
        self.expected_position = Some(position);
        self
    }

    async fn run(&self, ctx: &OrderingContext) -> Result<Mutation> {
        let Ok(position) = usize::try_from(self.position) else {
            return Err(self.below_zero(ctx).await?);
        };
        relocate(
            ctx,
            &self.id,
            None,
            self.container.as_ref(),
            position,
            self.expected_position,
        )
        .await
    }

    /// Out-of-range error for a negative target, with the bound the target container allows
    async fn below_zero(&self, ctx: &OrderingContext) -> Result<OrderingError> {
        let item = ctx.read_item(&self.id).await?;
        let dest = match &self.container {
            Some(container) => ctx.read_container(container).await?.id,
            None => item.container_id.clone(),
        };
        let count = ctx.read_items(&dest).await?.len();
        let max = if dest == item.container_id {
            count.saturating_sub(1)
        } else {
            count
        };
        Ok(OrderingError::OutOfRange {
            position: self.position,
            max,
        })
    }
}

#[async_trait]
impl Execute<OrderingContext, OrderingError> for MoveItem {
    async fn execute(&self, ctx: &OrderingContext) -> ExecutionResult<Value, OrderingError> {
        logged(self, self.run(ctx)).await
    }
}
