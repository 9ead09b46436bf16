// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

#![allow(clippy::unwrap_used)]

use super::*;
use crate::item::{NewWorkItem, Priority};
use crate::store::Store;

fn seeded_store() -> Store {
    let store = Store::open_in_memory().unwrap();
    for (name, is_closed, position) in [
        ("New", false, 1),
        ("In Progress", false, 2),
        ("Resolved", true, 3),
        ("Closed", true, 4),
        ("Failed", true, 5),
        ("Passed", true, 6),
    ] {
        store.create_status(name, is_closed, position).unwrap();
    }
    store
}

fn story(store: &Store) -> i64 {
    let status = store.status_by_name("New").unwrap();
    store
        .create_item(&NewWorkItem::new(WorkItemKind::UserStory, "Story", status.id))
        .unwrap()
        .id
}

fn child(store: &Store, parent: i64, kind: WorkItemKind, status: &str, priority: Priority) -> i64 {
    let status = store.status_by_name(status).unwrap();
    store
        .create_item(
            &NewWorkItem::new(kind, format!("{kind} child"), status.id)
                .with_parent(parent)
                .with_priority(priority),
        )
        .unwrap()
        .id
}

fn developer() -> Actor {
    Actor::new(7, "developer")
}

#[test]
fn rejects_non_user_story() {
    let store = seeded_store();
    let status = store.status_by_name("New").unwrap();
    let bug = store
        .create_item(&NewWorkItem::new(WorkItemKind::Bug, "Bug", status.id))
        .unwrap();

    assert!(matches!(
        validate_release_readiness(&store, bug.id),
        Err(Error::NotUserStory { .. })
    ));
}

#[test]
fn all_layers_failing() {
    let store = seeded_store();
    let story = story(&store);
    child(&store, story, WorkItemKind::Task, "New", Priority::Normal);
    child(&store, story, WorkItemKind::Task, "In Progress", Priority::Normal);
    child(&store, story, WorkItemKind::Test, "Failed", Priority::Normal);
    child(&store, story, WorkItemKind::Bug, "New", Priority::Urgent);

    let readiness = validate_release_readiness(&store, story).unwrap();

    assert!(!readiness.release_ready);
    assert_eq!(readiness.summary, "0/3 layers passed");
    assert_eq!(readiness.blocking_issues.len(), 4);

    assert_eq!(readiness.task_completion.total, 2);
    assert_eq!(readiness.task_completion.blocking, 2);
    assert_eq!(readiness.task_completion.issues[0].reason, "incomplete task");

    assert_eq!(readiness.test_success.blocking, 1);
    assert_eq!(readiness.test_success.issues[0].reason, "test not passed");

    assert_eq!(readiness.bug_resolution.blocking, 1);
    assert!(readiness.bug_resolution.issues[0]
        .reason
        .contains("unresolved critical bug"));
    assert!(readiness.bug_resolution.issues[0].reason.contains("urgent"));
}

#[test]
fn normal_priority_bugs_are_ignored() {
    let store = seeded_store();
    let story = story(&store);
    child(&store, story, WorkItemKind::Task, "Closed", Priority::Normal);
    child(&store, story, WorkItemKind::Test, "Passed", Priority::Normal);
    child(&store, story, WorkItemKind::Bug, "New", Priority::Normal);

    let readiness = validate_release_readiness(&store, story).unwrap();

    assert!(readiness.release_ready);
    assert_eq!(readiness.summary, "3/3 layers passed");
    assert!(readiness.blocking_issues.is_empty());
    // A normal-priority bug is not even counted.
    assert_eq!(readiness.bug_resolution.total, 0);
}

#[test]
fn resolved_critical_bug_passes_layer_three() {
    let store = seeded_store();
    let story = story(&store);
    child(&store, story, WorkItemKind::Test, "Passed", Priority::Normal);
    child(&store, story, WorkItemKind::Bug, "Resolved", Priority::Immediate);

    let readiness = validate_release_readiness(&store, story).unwrap();

    assert!(readiness.release_ready);
    assert_eq!(readiness.bug_resolution.total, 1);
    assert_eq!(readiness.bug_resolution.blocking, 0);
}

#[test]
fn zero_tasks_pass_but_zero_tests_fail() {
    let store = seeded_store();
    let story = story(&store);

    let readiness = validate_release_readiness(&store, story).unwrap();

    assert!(readiness.task_completion.passed);
    assert_eq!(readiness.task_completion.total, 0);

    assert!(!readiness.test_success.passed);
    assert_eq!(readiness.test_success.warning, Some("no tests exist"));
    assert!(readiness.test_success.issues.is_empty());

    assert!(!readiness.release_ready);
    assert_eq!(readiness.summary, "2/3 layers passed");
}

#[test]
fn failed_status_blocks_even_though_closed() {
    let store = seeded_store();
    let story = story(&store);
    // "Failed" is a closed status, but it is never a passing one.
    child(&store, story, WorkItemKind::Test, "Failed", Priority::Normal);

    let readiness = validate_release_readiness(&store, story).unwrap();
    assert!(!readiness.test_success.passed);
    assert_eq!(readiness.test_success.warning, None);
}

#[test]
fn open_test_blocks_layer_two() {
    let store = seeded_store();
    let story = story(&store);
    child(&store, story, WorkItemKind::Test, "In Progress", Priority::Normal);

    let readiness = validate_release_readiness(&store, story).unwrap();
    assert!(!readiness.test_success.passed);
    assert_eq!(readiness.test_success.total, 1);
}

#[test]
fn forced_bypass_without_reason_is_rejected() {
    let store = seeded_store();
    let story = story(&store);
    // Rejected regardless of validation state, even for a passing story.
    child(&store, story, WorkItemKind::Test, "Passed", Priority::Normal);

    for reason in ["", "   "] {
        assert!(matches!(
            attempt_bypass(&store, story, true, reason, &developer()),
            Err(Error::MissingBypassReason)
        ));
    }
}

#[test]
fn passing_story_needs_no_bypass() {
    let store = seeded_store();
    let story = story(&store);
    child(&store, story, WorkItemKind::Test, "Passed", Priority::Normal);

    let bypass = attempt_bypass(&store, story, true, "hotfix window", &developer()).unwrap();
    assert!(!bypass.bypassed);
    assert!(bypass.reason.is_none());
    assert!(bypass.validation.release_ready);
}

#[test]
fn forced_bypass_with_reason_succeeds() {
    let store = seeded_store();
    let story = story(&store);
    child(&store, story, WorkItemKind::Task, "New", Priority::Normal);

    let bypass = attempt_bypass(&store, story, true, "hotfix window", &developer()).unwrap();
    assert!(bypass.bypassed);
    assert_eq!(bypass.reason.as_deref(), Some("hotfix window"));
    assert!(!bypass.validation.release_ready);
}

#[test]
fn unforced_attempt_never_bypasses() {
    let store = seeded_store();
    let story = story(&store);
    child(&store, story, WorkItemKind::Task, "New", Priority::Normal);

    let bypass = attempt_bypass(&store, story, false, "", &developer()).unwrap();
    assert!(!bypass.bypassed);
    assert!(!bypass.validation.release_ready);
}

#[test]
fn readiness_serializes_for_api_responses() {
    let store = seeded_store();
    let story = story(&store);
    child(&store, story, WorkItemKind::Test, "Passed", Priority::Normal);

    let readiness = validate_release_readiness(&store, story).unwrap();
    let json = serde_json::to_value(&readiness).unwrap();

    assert_eq!(json["release_ready"], true);
    assert_eq!(json["summary"], "3/3 layers passed");
    // Absent warnings are omitted from the payload entirely.
    assert!(json["test_success"].get("warning").is_none());
}
