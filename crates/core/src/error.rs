// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Error types for rk-core operations.

use thiserror::Error;

/// All possible errors that can occur in rk-core operations.
///
/// Callers branch on the variant, never on message text. Validation errors
/// are raised before any write; persistence errors mid-cascade roll back the
/// whole operation.
#[derive(Debug, Error)]
pub enum Error {
    #[error("work item not found: #{0}")]
    WorkItemNotFound(i64),

    #[error("status not found: {0}")]
    StatusNotFound(String),

    #[error("version not found: #{0}")]
    VersionNotFound(i64),

    #[error("invalid column: '{0}'\n  hint: valid columns are: backlog, ready, in_progress, review, testing, done")]
    InvalidColumn(String),

    #[error("no reachable status: #{id} cannot move from '{from}' into column '{column}'")]
    NoReachableStatus {
        id: i64,
        from: String,
        column: String,
    },

    #[error("work item #{id} is a {kind}, not a user story")]
    NotUserStory {
        id: i64,
        kind: crate::item::WorkItemKind,
    },

    #[error("relation conflict: #{from} {rel} #{to} ({cause})")]
    RelationConflict {
        from: i64,
        to: i64,
        rel: String,
        cause: &'static str,
    },

    #[error("{child} cannot be a child of {parent}")]
    InvalidHierarchy {
        child: crate::item::WorkItemKind,
        parent: crate::item::WorkItemKind,
    },

    #[error("stale revision for #{id}: expected {expected}, found {actual}")]
    StaleRevision {
        id: i64,
        expected: i64,
        actual: i64,
    },

    #[error("a reason is required to bypass the release guard")]
    MissingBypassReason,

    #[error("invalid work item kind: '{0}'\n  hint: valid kinds are: epic, feature, user_story, task, test, bug")]
    InvalidKind(String),

    #[error("invalid priority: '{0}'\n  hint: valid priorities are: normal, high, urgent, immediate")]
    InvalidPriority(String),

    #[error("invalid relation type: '{0}'\n  hint: the only valid relation type is: blocks")]
    InvalidRelation(String),

    #[error("invalid version status: '{0}'\n  hint: valid statuses are: open, closed")]
    InvalidVersionStatus(String),

    #[error("missing configuration: {0}")]
    MissingConfiguration(String),

    #[error("persistence failure: {0}")]
    Persistence(#[from] rusqlite::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("corrupted data: {0}")]
    CorruptedData(String),
}

/// A specialized Result type for rk-core operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
