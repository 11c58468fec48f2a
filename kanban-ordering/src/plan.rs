//! Reorder planning
//!
//! Pure arithmetic over sibling lists that have already been read from a store. A planner
//! never touches storage: it validates the request against the siblings it was given and
//! returns a [`ReorderPlan`] describing every position change. The store then applies the
//! plan as one atomic batch.
//!
//! All planners require their input containers to already be dense (`0..n`). A container
//! that is not dense is reported as [`OrderingError::Torn`] and must be repaired with
//! [`plan_reindex`] before it can be reordered again.

use crate::error::{OrderingError, Result};
use crate::types::{ContainerId, Item, ItemId};
use serde::Serialize;
use std::collections::HashSet;

/// One sibling whose position changes as a side effect of a reorder
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Shift {
    pub item: ItemId,
    pub container: ContainerId,
    pub from: usize,
    pub to: usize,
}

/// The change to the item the request is about
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Placement {
    /// A new item appended to its container
    Insert { item: Item },
    /// An existing item reassigned to a (container, position) pair
    Move {
        item: ItemId,
        from_container: ContainerId,
        from: usize,
        to_container: ContainerId,
        to: usize,
    },
    /// An item taken out of its container
    Remove {
        item: ItemId,
        container: ContainerId,
        position: usize,
    },
}

/// Every position change needed to satisfy one request
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReorderPlan {
    pub shifts: Vec<Shift>,
    pub placement: Option<Placement>,
}

impl ReorderPlan {
    /// A plan that changes nothing
    pub fn noop() -> Self {
        Self::default()
    }

    /// True when applying the plan would write nothing
    pub fn is_noop(&self) -> bool {
        self.shifts.is_empty() && self.placement.is_none()
    }

    /// Number of rows the plan writes
    pub fn writes(&self) -> usize {
        self.shifts.len() + usize::from(self.placement.is_some())
    }

    /// Containers whose ordering the plan touches, deduplicated and sorted
    pub fn containers(&self) -> Vec<ContainerId> {
        let mut ids: Vec<ContainerId> = self.shifts.iter().map(|s| s.container.clone()).collect();
        match &self.placement {
            Some(Placement::Insert { item }) => ids.push(item.container_id.clone()),
            Some(Placement::Move {
                from_container,
                to_container,
                ..
            }) => {
                ids.push(from_container.clone());
                ids.push(to_container.clone());
            }
            Some(Placement::Remove { container, .. }) => ids.push(container.clone()),
            None => {}
        }
        ids.sort();
        ids.dedup();
        ids
    }
}

/// Check that `items` hold exactly the positions `0..n`
pub fn check_dense(container: &ContainerId, items: &[Item]) -> Result<()> {
    let n = items.len();
    let mut seen = vec![false; n];

    for item in items {
        if item.container_id != *container {
            return Err(OrderingError::torn(
                container,
                format!("item '{}' belongs to '{}'", item.id, item.container_id),
            ));
        }
        if item.position >= n {
            return Err(OrderingError::torn(
                container,
                format!(
                    "item '{}' at position {} but only {} items",
                    item.id, item.position, n
                ),
            ));
        }
        if std::mem::replace(&mut seen[item.position], true) {
            return Err(OrderingError::torn(
                container,
                format!("duplicate position {}", item.position),
            ));
        }
    }

    Ok(())
}

/// Find `item` among `items` and confirm the caller's view of its position
fn locate(items: &[Item], item: &ItemId, expected: usize) -> Result<usize> {
    let found = items
        .iter()
        .find(|i| i.id == *item)
        .ok_or_else(|| OrderingError::item_not_found(item))?;

    if found.position != expected {
        return Err(OrderingError::Conflict {
            item: item.to_string(),
            expected,
            actual: found.position,
        });
    }
    Ok(found.position)
}

fn shift(item: &Item, to: usize) -> Shift {
    Shift {
        item: item.id.clone(),
        container: item.container_id.clone(),
        from: item.position,
        to,
    }
}

/// Plan a move of `item` from `old_position` to `new_position` inside one container
///
/// Moving forward (`old < new`), siblings in `(old, new]` have their position decremented.
/// Moving backward, siblings in `[new, old)` have it incremented. Everything else is
/// untouched. Moving an item onto its own position is a no-op plan, even in a torn container.
pub fn plan_move_within(
    container: &ContainerId,
    items: &[Item],
    item: &ItemId,
    old_position: usize,
    new_position: usize,
) -> Result<ReorderPlan> {
    let old = locate(items, item, old_position)?;
    if old == new_position {
        return Ok(ReorderPlan::noop());
    }
    check_dense(container, items)?;

    // items is non-empty here since it contains `item`
    let max = items.len() - 1;
    if new_position > max {
        return Err(OrderingError::OutOfRange {
            position: new_position as i64,
            max,
        });
    }

    let mut shifts: Vec<Shift> = items
        .iter()
        .filter(|s| s.id != *item)
        .filter_map(|s| {
            if old < new_position && s.position > old && s.position <= new_position {
                Some(shift(s, s.position - 1))
            } else if old > new_position && s.position >= new_position && s.position < old {
                Some(shift(s, s.position + 1))
            } else {
                None
            }
        })
        .collect();
    shifts.sort_by_key(|s| s.from);

    Ok(ReorderPlan {
        shifts,
        placement: Some(Placement::Move {
            item: item.clone(),
            from_container: container.clone(),
            from: old,
            to_container: container.clone(),
            to: new_position,
        }),
    })
}

/// Plan a move of `item` out of `source` and into `dest` at `new_position`
///
/// Two independent passes: siblings after the item in the source close the gap (-1), items
/// at or after the target slot in the destination open one (+1). The target may be any slot
/// in `0..=n_dst`, since the item is inserted rather than swapped in.
///
/// When `source == dest` this is exactly [`plan_move_within`]; running both passes over one
/// container would count the moved item twice.
pub fn plan_move_across(
    item: &ItemId,
    source: &ContainerId,
    source_items: &[Item],
    old_position: usize,
    dest: &ContainerId,
    dest_items: &[Item],
    new_position: usize,
) -> Result<ReorderPlan> {
    if source == dest {
        return plan_move_within(source, source_items, item, old_position, new_position);
    }

    check_dense(source, source_items)?;
    check_dense(dest, dest_items)?;
    let old = locate(source_items, item, old_position)?;

    if new_position > dest_items.len() {
        return Err(OrderingError::OutOfRange {
            position: new_position as i64,
            max: dest_items.len(),
        });
    }

    let mut shifts: Vec<Shift> = source_items
        .iter()
        .filter(|s| s.id != *item && s.position > old)
        .map(|s| shift(s, s.position - 1))
        .collect();
    shifts.extend(
        dest_items
            .iter()
            .filter(|s| s.position >= new_position)
            .map(|s| shift(s, s.position + 1)),
    );
    shifts.sort_by(|a, b| a.container.cmp(&b.container).then(a.from.cmp(&b.from)));

    Ok(ReorderPlan {
        shifts,
        placement: Some(Placement::Move {
            item: item.clone(),
            from_container: source.clone(),
            from: old,
            to_container: dest.clone(),
            to: new_position,
        }),
    })
}

/// Plan appending `item` to `container`: its position becomes the current count
pub fn plan_insert_at_end(
    container: &ContainerId,
    items: &[Item],
    mut item: Item,
) -> Result<ReorderPlan> {
    check_dense(container, items)?;
    if items.iter().any(|i| i.id == item.id) {
        return Err(OrderingError::duplicate_id(item.kind.as_str(), item.id.as_str()));
    }

    item.container_id = container.clone();
    item.position = items.len();

    Ok(ReorderPlan {
        shifts: Vec::new(),
        placement: Some(Placement::Insert { item }),
    })
}

/// Plan removing `item` (at `position`) from `container`; every later sibling moves up one
pub fn plan_remove(
    container: &ContainerId,
    items: &[Item],
    item: &ItemId,
    position: usize,
) -> Result<ReorderPlan> {
    check_dense(container, items)?;
    let position = locate(items, item, position)?;

    let mut shifts: Vec<Shift> = items
        .iter()
        .filter(|s| s.position > position)
        .map(|s| shift(s, s.position - 1))
        .collect();
    shifts.sort_by_key(|s| s.from);

    Ok(ReorderPlan {
        shifts,
        placement: Some(Placement::Remove {
            item: item.clone(),
            container: container.clone(),
            position,
        }),
    })
}

/// Plan a repair of a possibly torn container
///
/// Keeps the current relative order (position, then id as tie-break) and renumbers to
/// `0..n`. A dense container yields a no-op plan.
pub fn plan_reindex(container: &ContainerId, items: &[Item]) -> Result<ReorderPlan> {
    let mut ids = HashSet::with_capacity(items.len());
    for item in items {
        if item.container_id != *container {
            return Err(OrderingError::invalid_value(
                "items",
                format!("item '{}' belongs to '{}'", item.id, item.container_id),
            ));
        }
        if !ids.insert(&item.id) {
            return Err(OrderingError::duplicate_id(item.kind.as_str(), item.id.as_str()));
        }
    }

    let mut ordered: Vec<&Item> = items.iter().collect();
    ordered.sort_by(|a, b| a.position.cmp(&b.position).then_with(|| a.id.cmp(&b.id)));

    let shifts = ordered
        .into_iter()
        .enumerate()
        .filter(|(index, item)| item.position != *index)
        .map(|(index, item)| shift(item, index))
        .collect();

    Ok(ReorderPlan {
        shifts,
        placement: None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ItemKind;

    fn column(container: &str, ids: &[&str]) -> Vec<Item> {
        ids.iter()
            .enumerate()
            .map(|(pos, id)| Item::new(*id, container, ItemKind::Card, *id).at(pos))
            .collect()
    }

    /// Apply a plan to a flat list, the way a store would
    fn apply(items: &mut Vec<Item>, plan: &ReorderPlan) {
        for s in &plan.shifts {
            let item = items.iter_mut().find(|i| i.id == s.item).unwrap();
            assert_eq!(item.position, s.from);
            item.position = s.to;
        }
        match &plan.placement {
            Some(Placement::Insert { item }) => items.push(item.clone()),
            Some(Placement::Move {
                item,
                to_container,
                to,
                ..
            }) => {
                let moved = items.iter_mut().find(|i| i.id == *item).unwrap();
                moved.container_id = to_container.clone();
                moved.position = *to;
            }
            Some(Placement::Remove { item, .. }) => items.retain(|i| i.id != *item),
            None => {}
        }
    }

    fn order(items: &[Item], container: &str) -> Vec<String> {
        let mut in_container: Vec<&Item> = items
            .iter()
            .filter(|i| i.container_id.as_str() == container)
            .collect();
        in_container.sort_by_key(|i| i.position);
        in_container.iter().map(|i| i.id.to_string()).collect()
    }

    #[test]
    fn test_move_backward() {
        let c = ContainerId::from("todo");
        let mut items = column("todo", &["A", "B", "C", "D"]);

        let plan = plan_move_within(&c, &items, &"C".into(), 2, 0).unwrap();
        assert_eq!(plan.shifts.len(), 2);
        assert!(plan.shifts.iter().all(|s| s.to == s.from + 1));

        apply(&mut items, &plan);
        assert_eq!(order(&items, "todo"), ["C", "A", "B", "D"]);
        check_dense(&c, &items).unwrap();
    }

    #[test]
    fn test_move_forward() {
        let c = ContainerId::from("todo");
        let mut items = column("todo", &["A", "B", "C"]);

        let plan = plan_move_within(&c, &items, &"A".into(), 0, 2).unwrap();
        apply(&mut items, &plan);
        assert_eq!(order(&items, "todo"), ["B", "C", "A"]);
    }

    #[test]
    fn test_move_to_same_position_is_noop() {
        let c = ContainerId::from("todo");
        let items = column("todo", &["A", "B", "C"]);

        let plan = plan_move_within(&c, &items, &"B".into(), 1, 1).unwrap();
        assert!(plan.is_noop());
        assert_eq!(plan.writes(), 0);
    }

    #[test]
    fn test_same_position_in_torn_container_is_noop() {
        let c = ContainerId::from("todo");
        let mut items = column("todo", &["A", "B", "C"]);
        items[2].position = 5;

        let plan = plan_move_within(&c, &items, &"C".into(), 5, 5).unwrap();
        assert!(plan.is_noop());

        let plan = plan_move_across(&"A".into(), &c, &items, 0, &c, &items, 0).unwrap();
        assert!(plan.is_noop());

        let err = plan_move_within(&c, &items, &"A".into(), 0, 1).unwrap_err();
        assert!(matches!(err, OrderingError::Torn { .. }));
    }

    #[test]
    fn test_move_out_of_range_rejected() {
        let c = ContainerId::from("todo");
        let items = column("todo", &["A", "B", "C"]);

        let err = plan_move_within(&c, &items, &"A".into(), 0, 3).unwrap_err();
        assert!(matches!(
            err,
            OrderingError::OutOfRange {
                position: 3,
                max: 2
            }
        ));
    }

    #[test]
    fn test_stale_old_position_is_conflict() {
        let c = ContainerId::from("todo");
        let items = column("todo", &["A", "B", "C"]);

        let err = plan_move_within(&c, &items, &"A".into(), 1, 2).unwrap_err();
        assert!(matches!(
            err,
            OrderingError::Conflict {
                expected: 1,
                actual: 0,
                ..
            }
        ));
    }

    #[test]
    fn test_move_unknown_item() {
        let c = ContainerId::from("todo");
        let items = column("todo", &["A"]);
        let err = plan_move_within(&c, &items, &"Z".into(), 0, 0).unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn test_move_across() {
        let src = ContainerId::from("todo");
        let dst = ContainerId::from("done");
        let mut items = column("todo", &["A", "B", "C"]);
        items.extend(column("done", &["X", "Y"]));
        let (source_items, dest_items): (Vec<Item>, Vec<Item>) =
            items.iter().cloned().partition(|i| i.container_id == src);

        let plan =
            plan_move_across(&"B".into(), &src, &source_items, 1, &dst, &dest_items, 1).unwrap();
        assert_eq!(plan.containers(), vec![dst.clone(), src.clone()]);

        apply(&mut items, &plan);
        assert_eq!(order(&items, "todo"), ["A", "C"]);
        assert_eq!(order(&items, "done"), ["X", "B", "Y"]);
    }

    #[test]
    fn test_move_across_into_empty_container() {
        let src = ContainerId::from("todo");
        let dst = ContainerId::from("done");
        let mut items = column("todo", &["A", "B"]);
        let source_items = items.clone();

        let plan = plan_move_across(&"A".into(), &src, &source_items, 0, &dst, &[], 0).unwrap();
        apply(&mut items, &plan);
        assert_eq!(order(&items, "todo"), ["B"]);
        assert_eq!(order(&items, "done"), ["A"]);
    }

    #[test]
    fn test_move_across_append_slot_allowed_beyond_rejected() {
        let src = ContainerId::from("todo");
        let dst = ContainerId::from("done");
        let source_items = column("todo", &["A"]);
        let dest_items = column("done", &["X", "Y"]);

        assert!(
            plan_move_across(&"A".into(), &src, &source_items, 0, &dst, &dest_items, 2).is_ok()
        );
        let err = plan_move_across(&"A".into(), &src, &source_items, 0, &dst, &dest_items, 3)
            .unwrap_err();
        assert!(matches!(
            err,
            OrderingError::OutOfRange {
                position: 3,
                max: 2
            }
        ));
    }

    #[test]
    fn test_move_across_same_container_degenerates() {
        let c = ContainerId::from("todo");
        let items = column("todo", &["A", "B", "C", "D"]);

        let across = plan_move_across(&"A".into(), &c, &items, 0, &c, &items, 3).unwrap();
        let within = plan_move_within(&c, &items, &"A".into(), 0, 3).unwrap();
        assert_eq!(across, within);
    }

    #[test]
    fn test_insert_at_end() {
        let c = ContainerId::from("todo");
        let mut items = column("todo", &["A", "B", "C"]);

        let plan =
            plan_insert_at_end(&c, &items, Item::new("E", "ignored", ItemKind::Card, "E")).unwrap();
        assert!(plan.shifts.is_empty());

        apply(&mut items, &plan);
        assert_eq!(order(&items, "todo"), ["A", "B", "C", "E"]);
    }

    #[test]
    fn test_insert_duplicate_rejected() {
        let c = ContainerId::from("todo");
        let items = column("todo", &["A"]);
        let err =
            plan_insert_at_end(&c, &items, Item::new("A", "todo", ItemKind::Card, "A")).unwrap_err();
        assert!(matches!(err, OrderingError::DuplicateId { .. }));
    }

    #[test]
    fn test_remove_closes_gap() {
        let c = ContainerId::from("todo");
        let mut items = column("todo", &["A", "B", "C", "D"]);

        let plan = plan_remove(&c, &items, &"B".into(), 1).unwrap();
        assert_eq!(plan.shifts.len(), 2);

        apply(&mut items, &plan);
        assert_eq!(order(&items, "todo"), ["A", "C", "D"]);
        check_dense(&c, &items).unwrap();
    }

    #[test]
    fn test_torn_input_rejected() {
        let c = ContainerId::from("todo");
        let mut items = column("todo", &["A", "B", "C"]);
        items[2].position = 5;

        let err = plan_move_within(&c, &items, &"A".into(), 0, 1).unwrap_err();
        assert!(matches!(err, OrderingError::Torn { .. }));

        items[2].position = 1;
        let err = check_dense(&c, &items).unwrap_err();
        assert!(err.to_string().contains("duplicate position 1"));
    }

    #[test]
    fn test_reindex_repairs_gaps_and_duplicates() {
        let c = ContainerId::from("todo");
        let mut items = column("todo", &["A", "B", "C", "D"]);
        items[0].position = 4;
        items[1].position = 2;
        items[2].position = 2;
        items[3].position = 9;

        let plan = plan_reindex(&c, &items).unwrap();
        apply(&mut items, &plan);

        check_dense(&c, &items).unwrap();
        assert_eq!(order(&items, "todo"), ["B", "C", "A", "D"]);
    }

    #[test]
    fn test_reindex_dense_is_noop() {
        let c = ContainerId::from("todo");
        let items = column("todo", &["A", "B"]);
        assert!(plan_reindex(&c, &items).unwrap().is_noop());
    }
}
