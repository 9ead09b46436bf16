// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Kanban columns and the column-to-status mapping.
//!
//! The six columns are fixed; which concrete statuses each column maps to is
//! injected configuration ([`ColumnMap`]), since project status sets vary.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};

/// One of the six kanban lanes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Column {
    Backlog,
    Ready,
    InProgress,
    Review,
    Testing,
    Done,
}

impl Column {
    /// All columns in board order.
    pub const ALL: [Column; 6] = [
        Column::Backlog,
        Column::Ready,
        Column::InProgress,
        Column::Review,
        Column::Testing,
        Column::Done,
    ];

    /// Returns the string representation used in storage and display.
    pub fn as_str(&self) -> &'static str {
        match self {
            Column::Backlog => "backlog",
            Column::Ready => "ready",
            Column::InProgress => "in_progress",
            Column::Review => "review",
            Column::Testing => "testing",
            Column::Done => "done",
        }
    }
}

impl fmt::Display for Column {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Column {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "backlog" => Ok(Column::Backlog),
            "ready" => Ok(Column::Ready),
            "in_progress" => Ok(Column::InProgress),
            "review" => Ok(Column::Review),
            "testing" => Ok(Column::Testing),
            "done" => Ok(Column::Done),
            _ => Err(Error::InvalidColumn(s.to_string())),
        }
    }
}

/// Column-to-status mapping.
///
/// Each column maps to a non-empty ordered list of status names; the order
/// doubles as the tie-break when several reachable statuses qualify for a
/// column move. Status-to-column is effectively many-to-one, though
/// disjointness is not enforced here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnMap {
    lanes: Vec<(Column, Vec<String>)>,
}

impl ColumnMap {
    /// Build a mapping from explicit lane definitions.
    ///
    /// Every column must appear with at least one status name.
    pub fn new(lanes: Vec<(Column, Vec<String>)>) -> Result<Self> {
        for column in Column::ALL {
            match lanes.iter().find(|(c, _)| *c == column) {
                Some((_, statuses)) if !statuses.is_empty() => {}
                _ => {
                    return Err(Error::MissingConfiguration(format!(
                        "column '{column}' has no statuses"
                    )))
                }
            }
        }
        Ok(ColumnMap { lanes })
    }

    /// The ordered candidate status names for a column.
    pub fn statuses_for(&self, column: Column) -> &[String] {
        self.lanes
            .iter()
            .find(|(c, _)| *c == column)
            .map(|(_, statuses)| statuses.as_slice())
            .unwrap_or(&[])
    }

    /// The column a status name belongs to, if any (first lane wins).
    pub fn column_of(&self, status_name: &str) -> Option<Column> {
        self.lanes
            .iter()
            .find(|(_, statuses)| statuses.iter().any(|s| s == status_name))
            .map(|(c, _)| *c)
    }

    /// Returns true if the column's candidate set contains the status name.
    pub fn contains(&self, column: Column, status_name: &str) -> bool {
        self.statuses_for(column).iter().any(|s| s == status_name)
    }
}

impl Default for ColumnMap {
    /// The stock mapping shipped with the board.
    fn default() -> Self {
        let lanes = vec![
            (Column::Backlog, vec!["New".into(), "Open".into()]),
            (Column::Ready, vec!["Ready".into()]),
            (
                Column::InProgress,
                vec!["In Progress".into(), "Assigned".into()],
            ),
            (
                Column::Review,
                vec!["Review".into(), "Ready for Test".into()],
            ),
            (Column::Testing, vec!["Testing".into(), "QA".into()]),
            (Column::Done, vec!["Resolved".into(), "Closed".into()]),
        ];
        ColumnMap { lanes }
    }
}

#[cfg(test)]
#[path = "column_tests.rs"]
mod tests;
