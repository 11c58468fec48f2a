//! ReindexContainer command

use crate::context::OrderingContext;
use crate::error::{OrderingError, Result};
use crate::operation::{logged, operation, Execute, ExecutionResult, Mutation};
use crate::plan::plan_reindex;
use crate::types::ContainerId;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// Renumber a container's items to `0..n`, keeping their relative order
///
/// Recovers a container whose positions were left with gaps or duplicates by an earlier
/// writer. A container that is already dense is left alone.
#[derive(Debug, Deserialize, Serialize)]
pub struct ReindexContainer {
    pub container: ContainerId,
}

operation!(
    ReindexContainer,
    verb = "reindex",
    noun = "container",
    description = "Renumber a container's items to a dense 0..n sequence"
);

impl ReindexContainer {
    pub fn new(container: impl Into<ContainerId>) -> Self {
        Self {
            container: container.into(),
        }
    }

    async fn run(&self, ctx: &OrderingContext) -> Result<Mutation> {
        let container = ctx.read_container(&self.container).await?;
        let _guard = ctx.lock(&[container.id.clone()]).await?;

        let items = ctx.read_items(&container.id).await?;
        let plan = plan_reindex(&container.id, &items)?;
        let shifted = plan.shifts.len();

        if plan.is_noop() {
            return Ok(Mutation::Unchanged(json!({
                "container": container.id,
                "shifted": 0,
                "items": items,
            })));
        }

        tracing::warn!(container = %container.id, shifted, "repairing torn container");
        ctx.store().apply(&plan).await?;

        let items = ctx.read_items(&container.id).await?;
        Ok(Mutation::Applied(json!({
            "container": container.id,
            "shifted": shifted,
            "items": items,
        })))
    }
}

#[async_trait]
impl Execute<OrderingContext, OrderingError> for ReindexContainer {
    async fn execute(&self, ctx: &OrderingContext) -> ExecutionResult<Value, OrderingError> {
        logged(self, self.run(ctx)).await
    }
}
