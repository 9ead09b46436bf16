// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! State transition service: kanban column moves.
//!
//! A drag onto a column becomes a validated status change. The column's
//! candidate statuses are intersected with what the workflow graph allows
//! for the item's kind and the actor's role; moving to a column the item is
//! already in is a no-op, so retried moves are idempotent.

use serde::{Deserialize, Serialize};

use crate::column::{Column, ColumnMap};
use crate::error::{Error, Result};
use crate::store::Store;
use crate::workflow::Actor;

/// Result of a column move.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transition {
    /// True when the item was already in the target column; nothing was
    /// written, not even a timestamp.
    pub unchanged: bool,
    /// Status name before the move.
    pub old_status: String,
    /// Status name after the move (equal to `old_status` when unchanged).
    pub new_status: String,
}

/// Move a work item into a kanban column.
///
/// Tie-break when several reachable statuses qualify: the first match in the
/// column's ordered status list wins, so the choice is deterministic and the
/// operation stays idempotent under retries.
pub fn to_column(
    store: &Store,
    item_id: i64,
    column: Column,
    map: &ColumnMap,
    actor: &Actor,
) -> Result<Transition> {
    let item = store.work_item(item_id)?;
    let current = store.status(item.status_id)?;

    // Already in the target column: no write, no revision bump.
    if map.contains(column, &current.name) {
        return Ok(Transition {
            unchanged: true,
            old_status: current.name.clone(),
            new_status: current.name,
        });
    }

    let reachable = store.reachable_statuses(item.kind, item.status_id, &actor.role)?;

    let mut chosen = None;
    for name in map.statuses_for(column) {
        if let Some(status) = store.find_status_by_name(name)? {
            if reachable.contains(&status.id) {
                chosen = Some(status);
                break;
            }
        }
    }

    let Some(target) = chosen else {
        return Err(Error::NoReachableStatus {
            id: item.id,
            from: current.name,
            column: column.as_str().to_string(),
        });
    };

    store.update_status(item.id, target.id, item.revision)?;
    tracing::debug!(
        item = item.id,
        user = actor.user_id,
        from = %current.name,
        to = %target.name,
        "column move"
    );

    Ok(Transition {
        unchanged: false,
        old_status: current.name,
        new_status: target.name,
    })
}

#[cfg(test)]
#[path = "transition_tests.rs"]
mod tests;
