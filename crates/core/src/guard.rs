// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Validation guard service: the three-layer release readiness gate.
//!
//! A user story may progress toward release only when all three layers pass:
//! every child Task closed, every child Test passed (and at least one Test
//! exists), and every critical child Bug resolved. A forced bypass with a
//! recorded reason is the only way past a failing gate.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::item::{WorkItem, WorkItemKind};
use crate::store::Store;
use crate::workflow::Actor;

/// Test statuses that count as failed even if the status row is closed.
const FAILED_TEST_STATUSES: [&str; 2] = ["Failed", "Rejected"];

/// A child item blocking release, with enough detail to render a message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockingIssue {
    pub id: i64,
    pub subject: String,
    pub kind: WorkItemKind,
    pub status: String,
    pub reason: String,
}

/// Outcome of one validation layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LayerReport {
    /// Layer number, 1 through 3.
    pub layer: u8,
    /// Human-readable layer name.
    pub name: &'static str,
    pub passed: bool,
    /// Each blocking child, one entry per item.
    pub issues: Vec<BlockingIssue>,
    /// Children the layer considered.
    pub total: usize,
    /// Children blocking the layer.
    pub blocking: usize,
    /// Extra caution attached to the verdict (e.g. "no tests exist").
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<&'static str>,
}

/// Aggregated release-readiness verdict.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Readiness {
    /// True iff all three layers passed.
    pub release_ready: bool,
    pub task_completion: LayerReport,
    pub test_success: LayerReport,
    pub bug_resolution: LayerReport,
    /// Union of all layers' issues, in layer order.
    pub blocking_issues: Vec<BlockingIssue>,
    /// e.g. "2/3 layers passed".
    pub summary: String,
}

/// Outcome of a bypass attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Bypass {
    /// True only for a forced bypass with a recorded reason.
    pub bypassed: bool,
    /// The recorded reason when bypassed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    /// The validation the decision was based on.
    pub validation: Readiness,
}

/// Run all three layers against a user story and aggregate the verdict.
///
/// The layers are independent and order-insensitive; `release_ready` is
/// their conjunction.
pub fn validate_release_readiness(store: &Store, user_story_id: i64) -> Result<Readiness> {
    let story = store.work_item(user_story_id)?;
    story.require_user_story()?;

    let task_completion = task_completion_layer(store, &story)?;
    let test_success = test_success_layer(store, &story)?;
    let bug_resolution = bug_resolution_layer(store, &story)?;

    let layers = [&task_completion, &test_success, &bug_resolution];
    let release_ready = layers.iter().all(|l| l.passed);
    let passed_count = layers.iter().filter(|l| l.passed).count();
    let blocking_issues = layers
        .iter()
        .flat_map(|l| l.issues.iter().cloned())
        .collect();

    Ok(Readiness {
        release_ready,
        task_completion,
        test_success,
        bug_resolution,
        blocking_issues,
        summary: format!("{passed_count}/3 layers passed"),
    })
}

/// Layer 1: every direct child Task must be closed.
///
/// A story with zero Tasks passes vacuously.
fn task_completion_layer(store: &Store, story: &WorkItem) -> Result<LayerReport> {
    let tasks = store.children_of(story.id, &[WorkItemKind::Task])?;
    let mut issues = Vec::new();

    for task in &tasks {
        let status = store.status(task.status_id)?;
        if !status.is_closed {
            issues.push(blocking_issue(task, &status.name, "incomplete task"));
        }
    }

    Ok(LayerReport {
        layer: 1,
        name: "task completion",
        passed: issues.is_empty(),
        total: tasks.len(),
        blocking: issues.len(),
        issues,
        warning: None,
    })
}

/// Layer 2: every direct child Test must be in a passed status.
///
/// Deliberately stricter than layer 1: a story with zero Tests fails, since
/// absence of tests is itself a release blocker.
fn test_success_layer(store: &Store, story: &WorkItem) -> Result<LayerReport> {
    let tests = store.children_of(story.id, &[WorkItemKind::Test])?;
    let mut issues = Vec::new();

    for test in &tests {
        let status = store.status(test.status_id)?;
        let failed = FAILED_TEST_STATUSES.contains(&status.name.as_str());
        if !status.is_closed || failed {
            issues.push(blocking_issue(test, &status.name, "test not passed"));
        }
    }

    let passed = !tests.is_empty() && issues.is_empty();
    Ok(LayerReport {
        layer: 2,
        name: "test success",
        passed,
        total: tests.len(),
        blocking: issues.len(),
        issues,
        warning: if tests.is_empty() {
            Some("no tests exist")
        } else {
            None
        },
    })
}

/// Layer 3: every critical direct child Bug must be resolved.
///
/// Bugs at the default priority tier are ignored entirely.
fn bug_resolution_layer(store: &Store, story: &WorkItem) -> Result<LayerReport> {
    let bugs = store.children_of(story.id, &[WorkItemKind::Bug])?;
    let critical: Vec<_> = bugs.iter().filter(|b| b.priority.is_critical()).collect();
    let mut issues = Vec::new();

    for bug in &critical {
        let status = store.status(bug.status_id)?;
        if !status.is_closed {
            issues.push(blocking_issue(
                bug,
                &status.name,
                &format!("unresolved critical bug (priority: {})", bug.priority),
            ));
        }
    }

    Ok(LayerReport {
        layer: 3,
        name: "critical bug resolution",
        passed: issues.is_empty(),
        total: critical.len(),
        blocking: issues.len(),
        issues,
        warning: None,
    })
}

/// Attempt to bypass a failing release gate.
///
/// A bypass must be forced and carry a non-empty reason; the reason is
/// mandatory, and a forced attempt without one fails with
/// [`Error::MissingBypassReason`] regardless of validation state. There is
/// no automatic bypass path. The bypass itself mutates nothing; it is an
/// authorization signal plus an audit record.
pub fn attempt_bypass(
    store: &Store,
    user_story_id: i64,
    force_bypass: bool,
    bypass_reason: &str,
    actor: &Actor,
) -> Result<Bypass> {
    if force_bypass && bypass_reason.trim().is_empty() {
        return Err(Error::MissingBypassReason);
    }

    let validation = validate_release_readiness(store, user_story_id)?;

    if validation.release_ready {
        return Ok(Bypass {
            bypassed: false,
            reason: None,
            validation,
        });
    }

    if force_bypass {
        tracing::warn!(
            user_story = user_story_id,
            user = actor.user_id,
            reason = bypass_reason,
            "forced release guard bypass"
        );
        return Ok(Bypass {
            bypassed: true,
            reason: Some(bypass_reason.to_string()),
            validation,
        });
    }

    Ok(Bypass {
        bypassed: false,
        reason: None,
        validation,
    })
}

fn blocking_issue(item: &WorkItem, status: &str, reason: &str) -> BlockingIssue {
    BlockingIssue {
        id: item.id,
        subject: item.subject.clone(),
        kind: item.kind,
        status: status.to_string(),
        reason: reason.to_string(),
    }
}

#[cfg(test)]
#[path = "guard_tests.rs"]
mod tests;
