//! ListItems command

use crate::context::OrderingContext;
use crate::error::{OrderingError, Result};
use crate::operation::{operation, unlogged, Execute, ExecutionResult};
use crate::types::ContainerId;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// List the items of a container in position order
#[derive(Debug, Deserialize, Serialize)]
pub struct ListItems {
    pub container: ContainerId,
}

operation!(
    ListItems,
    verb = "list",
    noun = "items",
    description = "List the items of a container in position order"
);

impl ListItems {
    pub fn new(container: impl Into<ContainerId>) -> Self {
        Self {
            container: container.into(),
        }
    }

    async fn run(&self, ctx: &OrderingContext) -> Result<Value> {
        let container = ctx.read_container(&self.container).await?;
        let items = ctx.read_items(&container.id).await?;
        Ok(json!({
            "container": container,
            "count": items.len(),
            "items": items,
        }))
    }
}

#[async_trait]
impl Execute<OrderingContext, OrderingError> for ListItems {
    async fn execute(&self, ctx: &OrderingContext) -> ExecutionResult<Value, OrderingError> {
        unlogged(self.run(ctx)).await
    }
}
