// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

#![allow(clippy::unwrap_used)]

use super::*;
use crate::error::Error;
use crate::item::{RelationType, VersionStatus};

fn seeded_store() -> Store {
    let store = Store::open_in_memory().unwrap();
    store.create_status("New", false, 1).unwrap();
    store.create_status("Closed", true, 2).unwrap();
    store
}

fn story_with(store: &Store, f: impl FnOnce(NewWorkItem) -> NewWorkItem) -> WorkItem {
    let status = store.status_by_name("New").unwrap();
    let new = f(NewWorkItem::new(
        WorkItemKind::UserStory,
        "Checkout flow",
        status.id,
    ));
    store.create_item(&new).unwrap()
}

#[test]
fn generates_test_with_relation_and_inheritance() {
    let mut store = seeded_store();
    let v = store.create_version("1.0", None, VersionStatus::Open).unwrap();
    let story = story_with(&store, |s| {
        s.with_version(Some(v.id))
            .with_priority(Priority::High)
            .with_assignee(Some(5))
    });

    let companion =
        generate_test_for_user_story(&mut store, story.id, &Options::default()).unwrap();

    assert!(!companion.existing);
    assert!(companion.relation_created);

    let test = &companion.test;
    assert_eq!(test.kind, WorkItemKind::Test);
    assert_eq!(test.subject, "Test: Checkout flow");
    assert_eq!(test.parent_id, Some(story.id));
    assert_eq!(test.version_id, Some(v.id));
    assert_eq!(test.priority, Priority::High);
    assert_eq!(test.assignee_id, Some(5));

    let description = test.description.as_deref().unwrap();
    assert!(description.starts_with("User story: Checkout flow"));
    assert!(description.contains("Acceptance criteria:"));
    assert_eq!(description.matches("- [ ]").count(), 3);

    let relations = store.relations_from(test.id).unwrap();
    assert_eq!(relations.len(), 1);
    assert_eq!(relations[0].to_id, story.id);
    assert_eq!(relations[0].relation, RelationType::Blocks);
}

#[test]
fn new_test_starts_in_default_open_status() {
    let mut store = seeded_store();
    let story = story_with(&store, |s| s);

    let companion =
        generate_test_for_user_story(&mut store, story.id, &Options::default()).unwrap();
    let status = store.status(companion.test.status_id).unwrap();
    assert_eq!(status.name, "New");
    assert!(!status.is_closed);
}

#[test]
fn second_generation_returns_existing_test() {
    let mut store = seeded_store();
    let story = story_with(&store, |s| s);

    let first = generate_test_for_user_story(&mut store, story.id, &Options::default()).unwrap();
    let second = generate_test_for_user_story(&mut store, story.id, &Options::default()).unwrap();

    assert!(second.existing);
    assert!(!second.relation_created);
    assert_eq!(second.test.id, first.test.id);

    let tests = store.children_of(story.id, &[WorkItemKind::Test]).unwrap();
    assert_eq!(tests.len(), 1);
}

#[test]
fn force_recreate_makes_a_second_test() {
    let mut store = seeded_store();
    let story = story_with(&store, |s| s);

    let first = generate_test_for_user_story(&mut store, story.id, &Options::default()).unwrap();
    let options = Options {
        force_recreate: true,
        ..Options::default()
    };
    let second = generate_test_for_user_story(&mut store, story.id, &options).unwrap();

    assert!(!second.existing);
    assert_ne!(second.test.id, first.test.id);
    assert_eq!(
        store.children_of(story.id, &[WorkItemKind::Test]).unwrap().len(),
        2
    );
}

#[test]
fn options_override_inherited_fields() {
    let mut store = seeded_store();
    let inherited = store.create_version("1.0", None, VersionStatus::Open).unwrap();
    let wanted = store.create_version("2.0", None, VersionStatus::Open).unwrap();
    let story = story_with(&store, |s| {
        s.with_version(Some(inherited.id)).with_assignee(Some(5))
    });

    let options = Options {
        force_recreate: false,
        assignee_id: Some(9),
        priority: Some(Priority::Urgent),
        version_id: Some(wanted.id),
    };
    let companion = generate_test_for_user_story(&mut store, story.id, &options).unwrap();

    assert_eq!(companion.test.version_id, Some(wanted.id));
    assert_eq!(companion.test.priority, Priority::Urgent);
    assert_eq!(companion.test.assignee_id, Some(9));
}

#[test]
fn rejects_non_user_story() {
    let mut store = seeded_store();
    let status = store.status_by_name("New").unwrap();
    let task = store
        .create_item(&NewWorkItem::new(WorkItemKind::Task, "T", status.id))
        .unwrap();

    assert!(matches!(
        generate_test_for_user_story(&mut store, task.id, &Options::default()),
        Err(Error::NotUserStory { .. })
    ));
}

#[test]
fn missing_story_is_rejected() {
    let mut store = seeded_store();
    assert!(matches!(
        generate_test_for_user_story(&mut store, 42, &Options::default()),
        Err(Error::WorkItemNotFound(42))
    ));
}

#[test]
fn find_existing_test_ignores_other_children() {
    let mut store = seeded_store();
    let status = store.status_by_name("New").unwrap();
    let story = story_with(&store, |s| s);
    store
        .create_item(&NewWorkItem::new(WorkItemKind::Task, "T", status.id).with_parent(story.id))
        .unwrap();

    assert!(find_existing_test(&store, story.id).unwrap().is_none());

    let companion = ensure_test_exists(&mut store, story.id).unwrap();
    let found = find_existing_test(&store, story.id).unwrap().unwrap();
    assert_eq!(found.id, companion.test.id);
}
