//! VerifyContainer command

use crate::context::OrderingContext;
use crate::error::{OrderingError, Result};
use crate::operation::{operation, unlogged, Execute, ExecutionResult};
use crate::plan::check_dense;
use crate::types::ContainerId;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// Report whether a container's positions are exactly `0..n`
#[derive(Debug, Deserialize, Serialize)]
pub struct VerifyContainer {
    pub container: ContainerId,
}

operation!(
    VerifyContainer,
    verb = "verify",
    noun = "container",
    description = "Check that a container's positions are dense"
);

impl VerifyContainer {
    pub fn new(container: impl Into<ContainerId>) -> Self {
        Self {
            container: container.into(),
        }
    }

    async fn run(&self, ctx: &OrderingContext) -> Result<Value> {
        let container = ctx.read_container(&self.container).await?;
        let items = ctx.read_items(&container.id).await?;

        let detail = match check_dense(&container.id, &items) {
            Ok(()) => None,
            Err(OrderingError::Torn { detail, .. }) => Some(detail),
            Err(other) => return Err(other),
        };

        Ok(json!({
            "container": container.id,
            "count": items.len(),
            "dense": detail.is_none(),
            "detail": detail,
        }))
    }
}

#[async_trait]
impl Execute<OrderingContext, OrderingError> for VerifyContainer {
    async fn execute(&self, ctx: &OrderingContext) -> ExecutionResult<Value, OrderingError> {
        unlogged(self.run(ctx)).await
    }
}
