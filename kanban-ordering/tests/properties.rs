//! Property tests: density, round-trip, conservation and same-container degeneracy

use kanban_ordering::{
    container::AddContainer,
    item::{InsertAtEnd, MoveAcrossContainers, MoveWithinContainer, RemoveItem},
    plan::{check_dense, plan_move_across, plan_move_within, Placement, ReorderPlan},
    ContainerId, ContainerKind, Execute, Item, ItemKind, MemoryStore, OrderingContext,
};
use proptest::prelude::*;
use std::sync::Arc;

const COLUMNS: [&str; 3] = ["todo", "doing", "done"];
const MAX_ITEMS: usize = 12;

/// A column of `n` cards named `{prefix}0..{prefix}n`, positioned densely
fn column(container: &str, prefix: &str, n: usize) -> Vec<Item> {
    (0..n)
        .map(|p| Item::new(format!("{prefix}{p}"), container, ItemKind::Card, "card").at(p))
        .collect()
}

/// Apply a plan to in-memory item lists keyed by container
fn apply(lists: &mut Vec<(ContainerId, Vec<Item>)>, plan: &ReorderPlan) {
    for shift in &plan.shifts {
        let (_, items) = lists
            .iter_mut()
            .find(|(c, _)| *c == shift.container)
            .unwrap();
        let item = items.iter_mut().find(|i| i.id == shift.item).unwrap();
        assert_eq!(item.position, shift.from);
        item.position = shift.to;
    }

    if let Some(Placement::Move {
        item,
        from_container,
        to_container,
        to,
        ..
    }) = &plan.placement
    {
        let source = lists.iter().position(|(c, _)| c == from_container).unwrap();
        let index = lists[source].1.iter().position(|i| i.id == *item).unwrap();
        let mut moved = lists[source].1.remove(index);
        moved.container_id = to_container.clone();
        moved.position = *to;
        let dest = lists.iter().position(|(c, _)| c == to_container).unwrap();
        lists[dest].1.push(moved);
    }

    for (_, items) in lists.iter_mut() {
        items.sort_by_key(|i| i.position);
    }
}

fn ids(items: &[Item]) -> Vec<String> {
    items.iter().map(|i| i.id.to_string()).collect()
}

#[derive(Debug, Clone)]
enum Step {
    Insert(usize),
    Remove(usize, usize),
    Within(usize, usize, usize),
    Across(usize, usize, usize, usize),
}

fn step() -> impl Strategy<Value = Step> {
    let col = 0..COLUMNS.len();
    prop_oneof![
        col.clone().prop_map(Step::Insert),
        (col.clone(), 0..MAX_ITEMS).prop_map(|(c, i)| Step::Remove(c, i)),
        (col.clone(), 0..MAX_ITEMS, 0..MAX_ITEMS).prop_map(|(c, i, p)| Step::Within(c, i, p)),
        (col.clone(), 0..MAX_ITEMS, col, 0..=MAX_ITEMS)
            .prop_map(|(c, i, d, p)| Step::Across(c, i, d, p)),
    ]
}

/// Run one step through the commands; steps that name a missing slot are skipped
async fn run_step(ctx: &OrderingContext, step: &Step, counter: &mut usize) {
    match *step {
        Step::Insert(c) => {
            *counter += 1;
            InsertAtEnd::card(COLUMNS[c], format!("card {counter}"))
                .execute(ctx)
                .await
                .into_result()
                .unwrap();
        }
        Step::Remove(c, i) => {
            if let Some(item) = items_of(ctx, c).await.get(i) {
                RemoveItem::new(item.id.clone())
                    .from_position(i)
                    .execute(ctx)
                    .await
                    .into_result()
                    .unwrap();
            }
        }
        Step::Within(c, i, p) => {
            let items = items_of(ctx, c).await;
            if let Some(item) = items.get(i) {
                let p = p % items.len();
                MoveWithinContainer::new(item.id.clone(), p)
                    .from_position(i)
                    .execute(ctx)
                    .await
                    .into_result()
                    .unwrap();
            }
        }
        Step::Across(c, i, d, p) => {
            if let Some(item) = items_of(ctx, c).await.get(i) {
                let dest_len = items_of(ctx, d).await.len();
                // same-column targets are bounded by n-1, others by n
                let bound = if c == d { dest_len - 1 } else { dest_len };
                MoveAcrossContainers::new(item.id.clone(), COLUMNS[d], p.min(bound))
                    .from_position(i)
                    .execute(ctx)
                    .await
                    .into_result()
                    .unwrap();
            }
        }
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn density_holds_after_every_step(steps in prop::collection::vec(step(), 1..40)) {
        tokio_test::block_on(async {
            let ctx = OrderingContext::new(Arc::new(MemoryStore::new()));
            for column in COLUMNS {
                AddContainer::new(column, ContainerKind::Column, column)
                    .execute(&ctx)
                    .await
                    .into_result()
                    .unwrap();
            }

            let mut counter = 0;
            let mut inserted = 0usize;
            let mut removed = 0usize;
            for step in &steps {
                let before: usize = total(&ctx).await;
                run_step(&ctx, step, &mut counter).await;
                let after = total(&ctx).await;
                if after > before { inserted += 1; }
                if after < before { removed += 1; }

                for column in COLUMNS {
                    let id = ContainerId::from(column);
                    let items = ctx.read_items(&id).await.unwrap();
                    check_dense(&id, &items).unwrap();
                }
            }
            assert_eq!(total(&ctx).await, inserted - removed);
        });
    }

    #[test]
    fn noop_move_changes_nothing(n in 1..MAX_ITEMS, pick in 0..MAX_ITEMS) {
        let container = ContainerId::from("todo");
        let items = column("todo", "c", n);
        let at = pick % n;

        let plan = plan_move_within(&container, &items, &items[at].id, at, at).unwrap();
        prop_assert!(plan.is_noop());
        prop_assert_eq!(plan.writes(), 0);
    }

    #[test]
    fn move_then_move_back_restores_order(n in 1..MAX_ITEMS, p in 0..MAX_ITEMS, q in 0..MAX_ITEMS) {
        let container = ContainerId::from("todo");
        let (p, q) = (p % n, q % n);
        let mut lists = vec![(container.clone(), column("todo", "c", n))];
        let original = ids(&lists[0].1);
        let moved = lists[0].1[p].id.clone();

        let there = plan_move_within(&container, &lists[0].1, &moved, p, q).unwrap();
        apply(&mut lists, &there);
        check_dense(&container, &lists[0].1).unwrap();

        let back = plan_move_within(&container, &lists[0].1, &moved, q, p).unwrap();
        apply(&mut lists, &back);
        prop_assert_eq!(ids(&lists[0].1), original);
    }

    #[test]
    fn move_across_conserves_items(
        n_src in 1..MAX_ITEMS,
        n_dst in 0..MAX_ITEMS,
        pick in 0..MAX_ITEMS,
        target in 0..=MAX_ITEMS,
    ) {
        let source = ContainerId::from("todo");
        let dest = ContainerId::from("done");
        let old = pick % n_src;
        let new = target % (n_dst + 1);
        let mut lists = vec![
            (source.clone(), column("todo", "s", n_src)),
            (dest.clone(), column("done", "d", n_dst)),
        ];
        let moved = lists[0].1[old].id.clone();

        let plan = plan_move_across(
            &moved, &source, &lists[0].1, old, &dest, &lists[1].1, new,
        ).unwrap();
        apply(&mut lists, &plan);

        prop_assert_eq!(lists[0].1.len(), n_src - 1);
        prop_assert_eq!(lists[1].1.len(), n_dst + 1);
        prop_assert!(lists[0].1.iter().all(|i| i.id != moved));
        prop_assert_eq!(&lists[1].1[new].id, &moved);
        check_dense(&source, &lists[0].1).unwrap();
        check_dense(&dest, &lists[1].1).unwrap();
    }

    #[test]
    fn across_into_same_container_matches_within(
        n in 1..MAX_ITEMS,
        p in 0..MAX_ITEMS,
        q in 0..MAX_ITEMS,
    ) {
        let container = ContainerId::from("todo");
        let (p, q) = (p % n, q % n);
        let items = column("todo", "c", n);
        let moved = items[p].id.clone();

        let within = plan_move_within(&container, &items, &moved, p, q).unwrap();
        let across = plan_move_across(
            &moved, &container, &items, p, &container, &items, q,
        ).unwrap();
        prop_assert_eq!(&within, &across);

        let mut lists = vec![(container.clone(), items)];
        apply(&mut lists, &across);
        check_dense(&container, &lists[0].1).unwrap();
    }
}

async fn items_of(ctx: &OrderingContext, column: usize) -> Vec<Item> {
    ctx.read_items(&ContainerId::from(COLUMNS[column]))
        .await
        .unwrap()
}

async fn total(ctx: &OrderingContext) -> usize {
    let mut total = 0;
    for column in COLUMNS {
        total += ctx.read_items(&ContainerId::from(column)).await.unwrap().len();
    }
    total
}
