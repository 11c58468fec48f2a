//! ListContainers command

use crate::context::OrderingContext;
use crate::error::{OrderingError, Result};
use crate::operation::{operation, unlogged, Execute, ExecutionResult};
use crate::types::ContainerKind;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// List containers with their item counts, optionally only one kind
#[derive(Debug, Default, Deserialize, Serialize)]
pub struct ListContainers {
    #[serde(default)]
    pub kind: Option<ContainerKind>,
}

operation!(
    ListContainers,
    verb = "list",
    noun = "containers",
    description = "List containers and how many items each holds"
);

impl ListContainers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_kind(mut self, kind: ContainerKind) -> Self {
        self.kind = Some(kind);
        self
    }

    async fn run(&self, ctx: &OrderingContext) -> Result<Value> {
        let mut containers = Vec::new();
        for container in ctx.store().list_containers().await? {
            if self.kind.is_some_and(|kind| kind != container.kind) {
                continue;
            }
            let count = ctx.read_items(&container.id).await?.len();
            containers.push(json!({
                "id": container.id,
                "kind": container.kind,
                "name": container.name,
                "count": count,
            }));
        }

        Ok(json!({
            "count": containers.len(),
            "containers": containers,
        }))
    }
}

#[async_trait]
impl Execute<OrderingContext, OrderingError> for ListContainers {
    async fn execute(&self, ctx: &OrderingContext) -> ExecutionResult<Value, OrderingError> {
        unlogged(self.run(ctx)).await
    }
}
