//! OrderingProcessor - runs commands and records what they did

use crate::context::OrderingContext;
use crate::error::{OrderingError, Result};
use crate::operation::Execute;
use serde_json::Value;

/// Executes commands against a context and appends their log entries to the activity log
#[derive(Debug, Clone, Default)]
pub struct OrderingProcessor {
    actor: Option<String>,
}

impl OrderingProcessor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attribute every logged command to `actor`
    pub fn with_actor(actor: impl Into<String>) -> Self {
        Self {
            actor: Some(actor.into()),
        }
    }

    pub fn actor(&self) -> Option<&str> {
        self.actor.as_deref()
    }

    /// Execute `op`, log it if it changed (or failed to change) state, and return its value
    ///
    /// A failure to write the activity log is reported but does not fail the command; the
    /// state change has already been applied.
    pub async fn process<Op>(&self, op: &Op, ctx: &OrderingContext) -> Result<Value>
    where
        Op: Execute<OrderingContext, OrderingError>,
    {
        let op_string = op.op_string();
        tracing::debug!(op = %op_string, "executing");

        let (result, log_entry) = op.execute(ctx).await.split();

        if let Some(mut entry) = log_entry {
            if let Some(actor) = &self.actor {
                entry = entry.with_actor(actor.clone());
            }
            if let Err(e) = ctx.append_activity(&entry).await {
                tracing::warn!(op = %op_string, error = %e, "failed to write activity log");
            }
        }

        match &result {
            Ok(_) => tracing::debug!(op = %op_string, "completed"),
            Err(e) if e.is_retryable() => {
                tracing::warn!(op = %op_string, error = %e, "rejected, retry may succeed")
            }
            Err(e) => tracing::debug!(op = %op_string, error = %e, "failed"),
        }

        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::container::{AddContainer, ListItems};
    use crate::item::{InsertAtEnd, MoveItem};
    use crate::store::MemoryStore;
    use crate::types::ContainerKind;
    use std::sync::Arc;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_only_mutations_reach_the_activity_log() {
        let temp = TempDir::new().unwrap();
        let ctx = OrderingContext::new(Arc::new(MemoryStore::new()))
            .with_activity_log(temp.path().join("activity.jsonl"));
        let processor = OrderingProcessor::with_actor("tester");

        processor
            .process(&AddContainer::new("todo", ContainerKind::Column, "To Do"), &ctx)
            .await
            .unwrap();
        for id in ["A", "B"] {
            processor
                .process(&InsertAtEnd::card("todo", id).with_id(id), &ctx)
                .await
                .unwrap();
        }
        processor.process(&ListItems::new("todo"), &ctx).await.unwrap();
        // no-op move
        processor.process(&MoveItem::new("A", 0), &ctx).await.unwrap();
        processor.process(&MoveItem::new("A", 1), &ctx).await.unwrap();

        let entries = ctx.read_activity(None).await.unwrap();
        let ops: Vec<&str> = entries.iter().map(|e| e.op.as_str()).collect();
        assert_eq!(ops, ["move item", "insert item", "insert item", "add container"]);
        assert!(entries.iter().all(|e| e.actor.as_deref() == Some("tester")));
    }

    #[tokio::test]
    async fn test_failures_are_logged_and_returned() {
        let temp = TempDir::new().unwrap();
        let ctx = OrderingContext::new(Arc::new(MemoryStore::new()))
            .with_activity_log(temp.path().join("activity.jsonl"));
        let processor = OrderingProcessor::new();

        let err = processor
            .process(&InsertAtEnd::card("missing", "Card"), &ctx)
            .await
            .unwrap_err();
        assert!(err.is_not_found());

        let entries = ctx.read_activity(None).await.unwrap();
        assert_eq!(entries.len(), 1);
        assert!(entries[0].is_failure());
        assert!(entries[0].actor.is_none());
    }
}
