//! AddContainer command

use crate::context::OrderingContext;
use crate::error::{OrderingError, Result};
use crate::operation::{logged, operation, Execute, ExecutionResult, Mutation};
use crate::types::{Container, ContainerId, ContainerKind};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Create a new board or column
#[derive(Debug, Deserialize, Serialize)]
pub struct AddContainer {
    /// Container ID; minted when absent
    #[serde(default)]
    pub id: ContainerId,
    pub kind: ContainerKind,
    pub name: String,
}

operation!(
    AddContainer,
    verb = "add",
    noun = "container",
    description = "Create a new board or column"
);

impl AddContainer {
    pub fn new(id: impl Into<ContainerId>, kind: ContainerKind, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            kind,
            name: name.into(),
        }
    }

    async fn run(&self, ctx: &OrderingContext) -> Result<Mutation> {
        if self.name.trim().is_empty() {
            return Err(OrderingError::invalid_value("name", "must not be empty"));
        }

        let container = Container::new(self.id.clone(), self.kind, self.name.clone());
        ctx.store().create_container(&container).await?;

        tracing::info!(container = %container.id, kind = %container.kind, "container added");
        Ok(Mutation::Applied(serde_json::to_value(&container)?))
    }
}

#[async_trait]
impl Execute<OrderingContext, OrderingError> for AddContainer {
    async fn execute(&self, ctx: &OrderingContext) -> ExecutionResult<Value, OrderingError> {
        logged(self, self.run(ctx)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use serde_json::json;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_add_container() {
        let ctx = OrderingContext::new(Arc::new(MemoryStore::new()));

        let result = AddContainer::new("todo", ContainerKind::Column, "To Do")
            .execute(&ctx)
            .await;
        assert!(result.should_log());

        let value = result.into_result().unwrap();
        assert_eq!(value["id"], "todo");
        assert_eq!(value["kind"], "column");
        assert_eq!(ctx.read_container(&ContainerId::from("todo")).await.unwrap().name, "To Do");
    }

    #[tokio::test]
    async fn test_add_container_mints_id() {
        let ctx = OrderingContext::new(Arc::new(MemoryStore::new()));

        let op: AddContainer =
            serde_json::from_value(json!({"kind": "board", "name": "Roadmap"})).unwrap();
        let value = op.execute(&ctx).await.into_result().unwrap();
        assert_eq!(value["id"].as_str().unwrap().len(), 26);
    }

    #[tokio::test]
    async fn test_add_duplicate_container() {
        let ctx = OrderingContext::new(Arc::new(MemoryStore::new()));
        let op = AddContainer::new("todo", ContainerKind::Column, "To Do");

        op.execute(&ctx).await.into_result().unwrap();
        let result = op.execute(&ctx).await.into_result();
        assert!(matches!(result, Err(OrderingError::DuplicateId { .. })));
    }

    #[tokio::test]
    async fn test_add_container_empty_name() {
        let ctx = OrderingContext::new(Arc::new(MemoryStore::new()));
        let result = AddContainer::new("todo", ContainerKind::Column, "")
            .execute(&ctx)
            .await
            .into_result();
        assert!(matches!(result, Err(OrderingError::InvalidValue { .. })));
    }
}
