//! MoveAcrossContainers command

use super::relocate;
use crate::context::OrderingContext;
use crate::error::{OrderingError, Result};
use crate::operation::{logged, operation, Execute, ExecutionResult, Mutation};
use crate::types::{ContainerId, ItemId};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Move an item out of its container and into another one at a given slot
#[derive(Debug, Deserialize, Serialize)]
pub struct MoveAcrossContainers {
    /// The item to move
    pub id: ItemId,
    /// Destination container
    pub to: ContainerId,
    /// Target position in the destination, `0..=n`
    pub position: usize,
    /// Container the caller believes the item is in; checked when present
    #[serde(default)]
    pub from: Option<ContainerId>,
    /// Position the caller believes the item is at; checked when present
    #[serde(default)]
    pub expected_position: Option<usize>,
}

operation!(
    MoveAcrossContainers,
    verb = "transfer",
    noun = "item",
    description = "Move an item into another container at a given position"
);

impl MoveAcrossContainers {
    pub fn new(id: impl Into<ItemId>, to: impl Into<ContainerId>, position: usize) -> Self {
        Self {
            id: id.into(),
            to: to.into(),
            position,
            from: None,
            expected_position: None,
        }
    }

    /// Require the item to currently be in `container`
    pub fn from_container(mut self, container: impl Into<ContainerId>) -> Self {
        self.from = Some(container.into());
        self
    }

    /// Require the item to currently be at `position`
    pub fn from_position(mut self, position: usize) -> Self {
        self.expected_position = Some(position);
        self
    }

    async fn run(&self, ctx: &OrderingContext) -> Result<Mutation> {
        relocate(
            ctx,
            &self.id,
            self.from.as_ref(),
            Some(&self.to),
            self.position,
            self.expected_position,
        )
        .await
    }
}

#[async_trait]
impl Execute<OrderingContext, OrderingError> for MoveAcrossContainers {
    async fn execute(&self, ctx: &OrderingContext) -> ExecutionResult<Value, OrderingError> {
        logged(self, self.run(ctx)).await
    }
}
