// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

#![allow(clippy::unwrap_used)]

use super::*;
use crate::item::{NewWorkItem, WorkItemKind};

const STATUSES: [(&str, bool, i64); 10] = [
    ("New", false, 1),
    ("Ready", false, 2),
    ("In Progress", false, 3),
    ("Assigned", false, 4),
    ("Review", false, 5),
    ("Testing", false, 6),
    ("Resolved", true, 7),
    ("Closed", true, 8),
    ("Failed", true, 9),
    ("Passed", true, 10),
];

fn seeded_store() -> Store {
    let store = Store::open_in_memory().unwrap();
    for (name, is_closed, position) in STATUSES {
        store.create_status(name, is_closed, position).unwrap();
    }
    store
}

fn allow(store: &Store, kind: WorkItemKind, role: &str, from: &str, to: &str) {
    let from = store.status_by_name(from).unwrap();
    let to = store.status_by_name(to).unwrap();
    store.add_workflow_transition(kind, role, from.id, to.id).unwrap();
}

fn task_in(store: &Store, status: &str) -> i64 {
    let status = store.status_by_name(status).unwrap();
    store
        .create_item(&NewWorkItem::new(WorkItemKind::Task, "Task", status.id))
        .unwrap()
        .id
}

fn developer() -> Actor {
    Actor::new(7, "developer")
}

#[test]
fn moves_to_first_reachable_status_of_column() {
    let store = seeded_store();
    allow(&store, WorkItemKind::Task, "developer", "New", "Ready");
    let id = task_in(&store, "New");

    let result =
        to_column(&store, id, Column::Ready, &ColumnMap::default(), &developer()).unwrap();

    assert!(!result.unchanged);
    assert_eq!(result.old_status, "New");
    assert_eq!(result.new_status, "Ready");

    let item = store.work_item(id).unwrap();
    assert_eq!(item.status_id, store.status_by_name("Ready").unwrap().id);
    assert_eq!(item.revision, 1);
}

#[test]
fn move_to_current_column_is_a_no_op() {
    let store = seeded_store();
    let id = task_in(&store, "In Progress");

    let result = to_column(
        &store,
        id,
        Column::InProgress,
        &ColumnMap::default(),
        &developer(),
    )
    .unwrap();

    assert!(result.unchanged);
    assert_eq!(result.old_status, "In Progress");
    assert_eq!(result.new_status, "In Progress");
    // No write at all, not even a revision bump.
    assert_eq!(store.work_item(id).unwrap().revision, 0);
}

#[test]
fn repeated_move_is_idempotent() {
    let store = seeded_store();
    allow(&store, WorkItemKind::Task, "developer", "New", "Ready");
    let id = task_in(&store, "New");
    let map = ColumnMap::default();

    let first = to_column(&store, id, Column::Ready, &map, &developer()).unwrap();
    assert!(!first.unchanged);

    let second = to_column(&store, id, Column::Ready, &map, &developer()).unwrap();
    assert!(second.unchanged);
    assert_eq!(store.work_item(id).unwrap().revision, 1);
}

#[test]
fn tie_break_prefers_first_status_in_lane() {
    let store = seeded_store();
    // Both in_progress lane entries are reachable; the lane lists
    // "In Progress" before "Assigned".
    allow(&store, WorkItemKind::Task, "developer", "New", "Assigned");
    allow(&store, WorkItemKind::Task, "developer", "New", "In Progress");
    let id = task_in(&store, "New");

    let result = to_column(
        &store,
        id,
        Column::InProgress,
        &ColumnMap::default(),
        &developer(),
    )
    .unwrap();

    assert_eq!(result.new_status, "In Progress");
}

#[test]
fn unreachable_column_is_rejected() {
    let store = seeded_store();
    allow(&store, WorkItemKind::Task, "developer", "New", "Ready");
    let id = task_in(&store, "New");

    let err = to_column(&store, id, Column::Done, &ColumnMap::default(), &developer())
        .unwrap_err();
    match err {
        Error::NoReachableStatus { id: item, from, column } => {
            assert_eq!(item, id);
            assert_eq!(from, "New");
            assert_eq!(column, "done");
        }
        other => panic!("expected NoReachableStatus, got {other:?}"),
    }
    // The rejected move must leave the item untouched.
    assert_eq!(store.work_item(id).unwrap().revision, 0);
}

#[test]
fn role_without_edges_cannot_move() {
    let store = seeded_store();
    allow(&store, WorkItemKind::Task, "developer", "New", "Ready");
    let id = task_in(&store, "New");
    let reporter = Actor::new(9, "reporter");

    assert!(matches!(
        to_column(&store, id, Column::Ready, &ColumnMap::default(), &reporter),
        Err(Error::NoReachableStatus { .. })
    ));
}

#[test]
fn every_column_yields_a_defined_outcome() {
    let store = seeded_store();
    // One edge from New into each non-backlog column's first status.
    for to in ["Ready", "In Progress", "Review", "Testing", "Resolved"] {
        allow(&store, WorkItemKind::Task, "developer", "New", to);
    }
    let map = ColumnMap::default();

    for column in Column::ALL {
        let id = task_in(&store, "New");
        let result = to_column(&store, id, column, &map, &developer()).unwrap();
        let expected = if column == Column::Backlog {
            "New"
        } else {
            map.statuses_for(column)[0].as_str()
        };
        assert_eq!(result.new_status, expected, "column {column}");
    }
}

#[test]
fn missing_item_is_rejected() {
    let store = seeded_store();
    assert!(matches!(
        to_column(&store, 123, Column::Ready, &ColumnMap::default(), &developer()),
        Err(Error::WorkItemNotFound(123))
    ));
}
