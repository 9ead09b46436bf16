// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Workflow graph rows and the explicit acting-user context.
//!
//! The legal-transition graph is a per-kind, per-role table consulted by the
//! transition service; absence of an edge means the transition is illegal
//! for that role. There is no ambient current user: an [`Actor`] is passed
//! into every call that needs one.

use serde::{Deserialize, Serialize};

use crate::item::WorkItemKind;

/// The user on whose behalf an operation runs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    /// The acting user's ID, recorded in audit lines.
    pub user_id: i64,
    /// Role used to look up legal workflow transitions.
    pub role: String,
}

impl Actor {
    pub fn new(user_id: i64, role: impl Into<String>) -> Self {
        Actor {
            user_id,
            role: role.into(),
        }
    }
}

/// One edge of the legal-transition graph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkflowTransition {
    /// The work-item kind this edge applies to.
    pub kind: WorkItemKind,
    /// The role allowed to take this edge.
    pub role: String,
    /// Source status ID.
    pub from_status: i64,
    /// Target status ID.
    pub to_status: i64,
}

#[cfg(test)]
#[path = "workflow_tests.rs"]
mod tests;
