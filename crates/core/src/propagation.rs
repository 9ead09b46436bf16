// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Version and date propagation service.
//!
//! Cascades a user story's version assignment to its direct Task/Test/Bug
//! children, and (in the date-aware variant) computes start/due dates from
//! the version calendar and cascades them down — and conditionally up to a
//! UserStory parent. Every cascade is a single transaction: no partial
//! propagation is ever observable.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::item::{Version, WorkItemKind};
use crate::store::{Store, VersionDateWrite};
use crate::workflow::Actor;

/// Conflict-resolution mode for version propagation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    /// Set every selected child's version unconditionally (the default).
    #[default]
    ForceOverwrite,
    /// Skip children that already carry a version; only fill gaps.
    PreserveExisting,
}

/// Result of a version propagation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Propagated {
    pub propagated_count: usize,
    pub affected_issue_ids: Vec<i64>,
}

/// Computed schedule for a version change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateSpan {
    /// Effective date of the closest earlier version, or the new version's
    /// own date when no earlier one exists.
    pub start_date: NaiveDate,
    /// The new version's effective date.
    pub due_date: NaiveDate,
}

/// Predicted write set of a date-aware version change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Impact {
    pub total: usize,
    pub issue_ids: Vec<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<i64>,
    pub sibling_ids: Vec<i64>,
}

/// Result of a date-aware version change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateChange {
    /// Whether the item's version actually changed.
    pub issue_changed: bool,
    /// Whether the parent's version actually changed.
    pub parent_changed: bool,
    /// The computed schedule, when the new version carries a date.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dates: Option<DateSpan>,
    /// Every item written by the cascade, in write order.
    pub updated_ids: Vec<i64>,
}

/// Cascade a version assignment from a user story to its direct
/// Task/Test/Bug children.
///
/// `version_id = None` clears the children's versions. All updates happen
/// in one transaction; each written child gets a fresh timestamp, a
/// revision bump, and one audit line.
pub fn propagate_to_children(
    store: &mut Store,
    user_story_id: i64,
    version_id: Option<i64>,
    mode: Mode,
) -> Result<Propagated> {
    let story = store.work_item(user_story_id)?;
    story.require_user_story()?;

    // Resolve the version name up front: a bad id short-circuits with zero
    // side effects, and the audit lines need the name anyway.
    let version_name = match version_id {
        Some(id) => store.version(id)?.name,
        None => "None".to_string(),
    };

    let children = store.children_of(story.id, &WorkItemKind::USER_STORY_CHILDREN)?;
    let targets: Vec<_> = match mode {
        Mode::ForceOverwrite => children.iter().collect(),
        Mode::PreserveExisting => children.iter().filter(|c| c.version_id.is_none()).collect(),
    };

    let ids: Vec<i64> = targets.iter().map(|c| c.id).collect();
    store.assign_version_bulk(&ids, version_id)?;

    for child in &targets {
        tracing::info!(
            "version propagated: UserStory#{} -> {}#{}, version: {}",
            story.id,
            child.kind,
            child.id,
            version_name
        );
    }

    Ok(Propagated {
        propagated_count: ids.len(),
        affected_issue_ids: ids,
    })
}

/// Clear the version on every direct Task/Test/Bug child of a user story.
///
/// The bulk-clear form of [`propagate_to_children`], with the same
/// transactional and audit guarantees.
pub fn remove_version_from_children(store: &mut Store, user_story_id: i64) -> Result<Propagated> {
    propagate_to_children(store, user_story_id, None, Mode::ForceOverwrite)
}

/// Compute the schedule a version change implies, if the version is dated.
///
/// due = the new version's effective date; start = the effective date of
/// the closest earlier dated version, falling back to the new version's own
/// date when none exists.
pub fn dates_for_version_change(store: &Store, version: &Version) -> Result<Option<DateSpan>> {
    let Some(due_date) = version.effective_date else {
        return Ok(None);
    };

    let start_date = store
        .previous_version(version)?
        .and_then(|v| v.effective_date)
        .unwrap_or(due_date);

    Ok(Some(DateSpan {
        start_date,
        due_date,
    }))
}

/// Predict which items a date-aware version change would touch, without
/// writing anything.
pub fn calculate_impact(store: &Store, item_id: i64, update_parent: bool) -> Result<Impact> {
    let item = store.work_item(item_id)?;
    let mut issue_ids = vec![item.id];

    let children = store.children_of(item.id, &WorkItemKind::USER_STORY_CHILDREN)?;
    issue_ids.extend(children.iter().map(|c| c.id));

    let mut parent_id = None;
    let mut sibling_ids = Vec::new();
    if update_parent {
        if let Some(pid) = item.parent_id {
            let parent = store.work_item(pid)?;
            if parent.kind == WorkItemKind::UserStory {
                parent_id = Some(parent.id);
                sibling_ids = store
                    .children_of(parent.id, &[])?
                    .into_iter()
                    .map(|s| s.id)
                    .filter(|&id| id != item.id)
                    .collect();
                issue_ids.extend(&sibling_ids);
                issue_ids.push(parent.id);
            }
        }
    }

    Ok(Impact {
        total: issue_ids.len(),
        issue_ids,
        parent_id,
        sibling_ids,
    })
}

/// Change an item's version and cascade the computed dates.
///
/// The cascade is asymmetric by design, separating "this item's schedule"
/// from "this item's context": the item's own Task/Test/Bug children are
/// always updated, while the parent and siblings are updated only when
/// `update_parent` is set and the parent is a UserStory — never when the
/// parent is a Feature or Epic. Siblings are written before the parent.
/// The whole write set goes through one transaction.
pub fn change_version_with_dates(
    store: &mut Store,
    item_id: i64,
    new_version_id: Option<i64>,
    update_parent: bool,
    actor: &Actor,
) -> Result<DateChange> {
    let item = store.work_item(item_id)?;
    let new_version = match new_version_id {
        Some(id) => Some(store.version(id)?),
        None => None,
    };

    let dates = match &new_version {
        Some(version) => dates_for_version_change(store, version)?,
        None => None,
    };

    let write = |id: i64| VersionDateWrite {
        id,
        version_id: new_version_id,
        start_date: dates.map(|d| d.start_date),
        due_date: dates.map(|d| d.due_date),
    };

    let mut writes = vec![write(item.id)];

    // Children always follow their parent's schedule.
    for child in store.children_of(item.id, &WorkItemKind::USER_STORY_CHILDREN)? {
        writes.push(write(child.id));
    }

    let mut parent_changed = false;
    if update_parent {
        if let Some(pid) = item.parent_id {
            let parent = store.work_item(pid)?;
            if parent.kind == WorkItemKind::UserStory {
                // Siblings first, parent last.
                for sibling in store.children_of(parent.id, &[])? {
                    if sibling.id != item.id {
                        writes.push(write(sibling.id));
                    }
                }
                parent_changed = parent.version_id != new_version_id;
                writes.push(write(parent.id));
            }
        }
    }

    store.apply_version_dates(&writes)?;

    let updated_ids: Vec<i64> = writes.iter().map(|w| w.id).collect();
    tracing::info!(
        item = item.id,
        user = actor.user_id,
        version = ?new_version.as_ref().map(|v| v.name.as_str()),
        touched = updated_ids.len(),
        "version changed with dates"
    );

    Ok(DateChange {
        issue_changed: item.version_id != new_version_id,
        parent_changed,
        dates,
        updated_ids,
    })
}

#[cfg(test)]
#[path = "propagation_tests.rs"]
mod tests;
