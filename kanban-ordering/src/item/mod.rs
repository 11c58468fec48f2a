//! Item commands

mod insert;
mod move_across;
mod move_within;
mod mv;
mod remove;

pub use insert::InsertAtEnd;
pub use move_across::MoveAcrossContainers;
pub use move_within::MoveWithinContainer;
pub use mv::MoveItem;
pub use remove::RemoveItem;

use crate::context::OrderingContext;
use crate::error::{OrderingError, Result};
use crate::lock::ContainerGuard;
use crate::operation::Mutation;
use crate::plan::plan_move_across;
use crate::types::{ContainerId, Item, ItemId};

/// Attempts at pinning an item that keeps changing container under us
const PIN_ATTEMPTS: usize = 8;

/// Lock the item's current container (plus `extra`) and return the item as seen under lock
///
/// The item is read before locking to learn its container, then read again once the lock is
/// held. If another command moved it to a different container in between, the lock set is
/// wrong and the whole dance is repeated.
pub(crate) async fn pin_item(
    ctx: &OrderingContext,
    id: &ItemId,
    extra: Option<&ContainerId>,
) -> Result<(ContainerGuard, Item)> {
    let mut seen = ctx.read_item(id).await?;

    for _ in 0..PIN_ATTEMPTS {
        let mut containers = vec![seen.container_id.clone()];
        containers.extend(extra.cloned());

        let guard = ctx.lock(&containers).await?;
        let current = ctx.read_item(id).await?;
        if current.container_id == seen.container_id {
            return Ok((guard, current));
        }

        tracing::debug!(item = %id, from = %seen.container_id, to = %current.container_id,
            "item changed container while locking, retrying");
        seen = current;
    }

    Err(OrderingError::Unsettled {
        item: id.to_string(),
        attempts: PIN_ATTEMPTS,
    })
}

/// Resolve the position the caller believes the item is at
pub(crate) fn believed_position(item: &Item, expected: Option<usize>) -> usize {
    expected.unwrap_or(item.position)
}

/// Move `id` to `position` in `to`, or within its own container when `to` is `None`
///
/// Shared by the cross-container and generic move commands. The destination is decided
/// under lock, so a move into the item's own container plans as a within-container move.
pub(crate) async fn relocate(
    ctx: &OrderingContext,
    id: &ItemId,
    from: Option<&ContainerId>,
    to: Option<&ContainerId>,
    position: usize,
    expected_position: Option<usize>,
) -> Result<Mutation> {
    let dest = match to {
        Some(to) => Some(ctx.read_container(to).await?),
        None => None,
    };
    let (_guard, item) = pin_item(ctx, id, dest.as_ref().map(|c| &c.id)).await?;

    if let Some(from) = from {
        if *from != item.container_id {
            return Err(OrderingError::invalid_value(
                "from",
                format!("item '{}' is in '{}', not '{}'", item.id, item.container_id, from),
            ));
        }
    }

    let dest = match dest {
        Some(dest) => dest,
        None => ctx.read_container(&item.container_id).await?,
    };
    if !dest.accepts(item.kind) {
        return Err(OrderingError::KindMismatch {
            container: dest.id.to_string(),
            container_kind: dest.kind.to_string(),
            item_kind: item.kind.to_string(),
        });
    }

    let source_items = ctx.read_items(&item.container_id).await?;
    let dest_items = if dest.id == item.container_id {
        source_items.clone()
    } else {
        ctx.read_items(&dest.id).await?
    };

    let plan = plan_move_across(
        &item.id,
        &item.container_id,
        &source_items,
        believed_position(&item, expected_position),
        &dest.id,
        &dest_items,
        position,
    )?;

    if plan.is_noop() {
        tracing::debug!(item = %item.id, position = item.position, "move is a no-op");
        return Ok(Mutation::Unchanged(serde_json::to_value(&item)?));
    }

    tracing::debug!(item = %item.id, writes = plan.writes(), "applying move");
    ctx.store().apply(&plan).await?;

    let moved = ctx.read_item(&item.id).await?;
    tracing::info!(item = %moved.id, from = %item.container_id, to = %moved.container_id,
        position = moved.position, shifted = plan.shifts.len(), "item moved");
    Ok(Mutation::Applied(serde_json::to_value(&moved)?))
}
