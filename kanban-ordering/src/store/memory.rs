//! In-process store
//!
//! Holds everything behind one `RwLock`. `apply` validates the whole plan against the
//! current state before mutating anything, so a rejected plan leaves no trace.

use super::{stale, OrderingStore};
use crate::error::{OrderingError, Result};
use crate::plan::{Placement, ReorderPlan};
use crate::types::{Container, ContainerId, Item, ItemId};
use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use tokio::sync::RwLock;

#[derive(Debug, Default)]
struct State {
    containers: HashMap<ContainerId, Container>,
    items: HashMap<ItemId, Item>,
}

impl State {
    fn require_container(&self, id: &ContainerId) -> Result<()> {
        if self.containers.contains_key(id) {
            Ok(())
        } else {
            Err(OrderingError::container_not_found(id))
        }
    }

    /// Check that `item` currently sits at (`container`, `position`)
    fn expect_at(&self, item: &ItemId, container: &ContainerId, position: usize) -> Result<()> {
        match self.items.get(item) {
            Some(found) if found.container_id == *container && found.position == position => {
                Ok(())
            }
            found => Err(stale(item, position, found.map(|i| i.position))),
        }
    }

    fn count(&self, container: &ContainerId) -> usize {
        self.items
            .values()
            .filter(|i| i.container_id == *container)
            .count()
    }

    fn validate(&self, plan: &ReorderPlan) -> Result<()> {
        for shift in &plan.shifts {
            self.expect_at(&shift.item, &shift.container, shift.from)?;
        }

        match &plan.placement {
            Some(Placement::Insert { item }) => {
                self.require_container(&item.container_id)?;
                if self.items.contains_key(&item.id) {
                    return Err(OrderingError::duplicate_id(
                        item.kind.as_str(),
                        item.id.as_str(),
                    ));
                }
                let count = self.count(&item.container_id);
                if count != item.position {
                    return Err(stale(&item.id, item.position, Some(count)));
                }
            }
            Some(Placement::Move {
                item,
                from_container,
                from,
                to_container,
                ..
            }) => {
                self.require_container(to_container)?;
                self.expect_at(item, from_container, *from)?;
            }
            Some(Placement::Remove {
                item,
                container,
                position,
            }) => self.expect_at(item, container, *position)?,
            None => {}
        }

        Ok(())
    }
}

/// Store that keeps all rows in memory
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: RwLock<State>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl OrderingStore for MemoryStore {
    fn name(&self) -> &'static str {
        "memory"
    }

    async fn create_container(&self, container: &Container) -> Result<()> {
        let mut state = self.state.write().await;
        if state.containers.contains_key(&container.id) {
            return Err(OrderingError::duplicate_id(
                container.kind.as_str(),
                container.id.as_str(),
            ));
        }
        state
            .containers
            .insert(container.id.clone(), container.clone());
        Ok(())
    }

    async fn get_container(&self, id: &ContainerId) -> Result<Container> {
        self.state
            .read()
            .await
            .containers
            .get(id)
            .cloned()
            .ok_or_else(|| OrderingError::container_not_found(id))
    }

    async fn list_containers(&self) -> Result<Vec<Container>> {
        let state = self.state.read().await;
        let mut containers: Vec<Container> = state.containers.values().cloned().collect();
        containers.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(containers)
    }

    async fn list_items(&self, container: &ContainerId) -> Result<Vec<Item>> {
        let state = self.state.read().await;
        state.require_container(container)?;

        let mut items: Vec<Item> = state
            .items
            .values()
            .filter(|i| i.container_id == *container)
            .cloned()
            .collect();
        items.sort_by(|a, b| a.position.cmp(&b.position).then_with(|| a.id.cmp(&b.id)));
        Ok(items)
    }

    async fn get_item(&self, id: &ItemId) -> Result<Item> {
        self.state
            .read()
            .await
            .items
            .get(id)
            .cloned()
            .ok_or_else(|| OrderingError::item_not_found(id))
    }

    async fn apply(&self, plan: &ReorderPlan) -> Result<()> {
        let mut state = self.state.write().await;
        state.validate(plan)?;

        let now = Utc::now();
        for shift in &plan.shifts {
            if let Some(item) = state.items.get_mut(&shift.item) {
                item.position = shift.to;
                item.updated_at = now;
            }
        }

        match &plan.placement {
            Some(Placement::Insert { item }) => {
                let mut item = item.clone();
                item.updated_at = now;
                state.items.insert(item.id.clone(), item);
            }
            Some(Placement::Move {
                item,
                to_container,
                to,
                ..
            }) => {
                if let Some(moved) = state.items.get_mut(item) {
                    moved.container_id = to_container.clone();
                    moved.position = *to;
                    moved.updated_at = now;
                }
            }
            Some(Placement::Remove { item, .. }) => {
                state.items.remove(item);
            }
            None => {}
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plan::{plan_insert_at_end, plan_move_within, Shift};
    use crate::types::{ContainerKind, ItemKind};

    async fn seeded() -> MemoryStore {
        let store = MemoryStore::new();
        store
            .create_container(&Container::new("todo", ContainerKind::Column, "To Do"))
            .await
            .unwrap();

        for id in ["A", "B", "C"] {
            let items = store.list_items(&"todo".into()).await.unwrap();
            let plan = plan_insert_at_end(
                &"todo".into(),
                &items,
                Item::new(id, "todo", ItemKind::Card, id),
            )
            .unwrap();
            store.apply(&plan).await.unwrap();
        }
        store
    }

    #[tokio::test]
    async fn test_insert_and_list_in_order() {
        let store = seeded().await;
        let items = store.list_items(&"todo".into()).await.unwrap();
        let ids: Vec<&str> = items.iter().map(|i| i.id.as_str()).collect();
        assert_eq!(ids, ["A", "B", "C"]);
        assert_eq!(
            items.iter().map(|i| i.position).collect::<Vec<_>>(),
            [0, 1, 2]
        );
    }

    #[tokio::test]
    async fn test_apply_move() {
        let store = seeded().await;
        let items = store.list_items(&"todo".into()).await.unwrap();
        let plan = plan_move_within(&"todo".into(), &items, &"C".into(), 2, 0).unwrap();
        store.apply(&plan).await.unwrap();

        let items = store.list_items(&"todo".into()).await.unwrap();
        let ids: Vec<&str> = items.iter().map(|i| i.id.as_str()).collect();
        assert_eq!(ids, ["C", "A", "B"]);
    }

    #[tokio::test]
    async fn test_stale_plan_writes_nothing() {
        let store = seeded().await;
        let items = store.list_items(&"todo".into()).await.unwrap();
        let mut plan = plan_move_within(&"todo".into(), &items, &"C".into(), 2, 0).unwrap();

        // Corrupt the last shift so validation fails after earlier shifts were checked
        plan.shifts.push(Shift {
            item: "B".into(),
            container: "todo".into(),
            from: 7,
            to: 8,
        });

        let err = store.apply(&plan).await.unwrap_err();
        assert!(matches!(err, OrderingError::Conflict { expected: 7, .. }));

        let after = store.list_items(&"todo".into()).await.unwrap();
        assert_eq!(after, items);
    }

    #[tokio::test]
    async fn test_missing_container() {
        let store = MemoryStore::new();
        let err = store.list_items(&"nope".into()).await.unwrap_err();
        assert!(matches!(err, OrderingError::ContainerNotFound { .. }));
    }

    #[tokio::test]
    async fn test_duplicate_container() {
        let store = seeded().await;
        let err = store
            .create_container(&Container::new("todo", ContainerKind::Column, "Again"))
            .await
            .unwrap_err();
        assert!(matches!(err, OrderingError::DuplicateId { .. }));
    }
}
