// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Companion-item generation service.
//!
//! Materializes the Test work item paired 1:1 with a user story. The Test
//! blocks the story via a typed relation, inherits the story's version,
//! priority, and assignee, and is created at most once unless recreation is
//! forced. Item and relation are inserted in one transaction, so a failed
//! relation insert never leaves an orphan Test.

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::item::{NewWorkItem, Priority, WorkItem, WorkItemKind};
use crate::store::Store;

/// Overrides for companion generation; defaults inherit everything from the
/// user story.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Options {
    /// Create a new Test even when one already exists.
    pub force_recreate: bool,
    /// Override the inherited assignee.
    pub assignee_id: Option<i64>,
    /// Override the inherited priority.
    pub priority: Option<Priority>,
    /// Override the inherited version.
    pub version_id: Option<i64>,
}

/// Result of companion generation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Companion {
    /// The companion Test item (existing or newly created).
    pub test: WorkItem,
    /// True when an existing Test was returned instead of creating one.
    pub existing: bool,
    /// True when a `blocks` relation was created in this call.
    pub relation_created: bool,
}

fn test_subject(story_subject: &str) -> String {
    format!("Test: {story_subject}")
}

fn test_description(story_subject: &str) -> String {
    format!(
        "User story: {story_subject}\n\n\
         Acceptance criteria:\n\
         - [ ] Works as specified\n\
         - [ ] Errors are handled appropriately\n\
         - [ ] UI matches the design"
    )
}

/// The existing direct Test child of a user story, if any.
pub fn find_existing_test(store: &Store, user_story_id: i64) -> Result<Option<WorkItem>> {
    let tests = store.children_of(user_story_id, &[WorkItemKind::Test])?;
    Ok(tests.into_iter().next())
}

/// Generate the companion Test for a user story.
///
/// Idempotent by default: if a Test child already exists it is returned
/// with `existing = true` and nothing is written. With `force_recreate` the
/// lookup is skipped and a fresh Test is created.
pub fn generate_test_for_user_story(
    store: &mut Store,
    user_story_id: i64,
    options: &Options,
) -> Result<Companion> {
    let story = store.work_item(user_story_id)?;
    story.require_user_story()?;

    if !options.force_recreate {
        if let Some(test) = find_existing_test(store, story.id)? {
            return Ok(Companion {
                test,
                existing: true,
                relation_created: false,
            });
        }
    }

    let status = store.default_open_status()?;
    let new = NewWorkItem::new(WorkItemKind::Test, test_subject(&story.subject), status.id)
        .with_description(test_description(&story.subject))
        .with_parent(story.id)
        .with_version(options.version_id.or(story.version_id))
        .with_priority(options.priority.unwrap_or(story.priority))
        .with_assignee(options.assignee_id.or(story.assignee_id));

    // One transaction: the Test blocks its story, or neither exists.
    let test = store.create_item_with_relation(&new, story.id)?;

    tracing::info!(
        "test generated: UserStory#{} -> Test#{}",
        story.id,
        test.id
    );

    Ok(Companion {
        test,
        existing: false,
        relation_created: true,
    })
}

/// Guarantee a Test exists before a story enters a "ready" state.
///
/// Convenience wrapper over [`generate_test_for_user_story`] that never
/// forces recreation.
pub fn ensure_test_exists(store: &mut Store, user_story_id: i64) -> Result<Companion> {
    generate_test_for_user_story(store, user_story_id, &Options::default())
}

#[cfg(test)]
#[path = "companion_tests.rs"]
mod tests;
