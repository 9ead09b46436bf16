// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Core work-item types for the release kanban engine.
//!
//! This module contains the fundamental data types: WorkItem, WorkItemKind,
//! Priority, Status, Version, and Relation, plus the fixed hierarchy rules
//! (Epic → Feature → UserStory → {Task, Test, Bug}).

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};

/// Classification of work items within the fixed four-level hierarchy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkItemKind {
    /// Top-level initiative spanning multiple features.
    Epic,
    /// Deliverable grouping of user stories.
    Feature,
    /// Unit of user-visible value; the only kind the release guard applies to.
    UserStory,
    /// Implementation work under a user story.
    Task,
    /// Acceptance test paired with a user story.
    Test,
    /// Defect under a user story (or, exceptionally, a feature).
    Bug,
}

impl WorkItemKind {
    /// Returns the string representation used in storage and display.
    pub fn as_str(&self) -> &'static str {
        match self {
            WorkItemKind::Epic => "epic",
            WorkItemKind::Feature => "feature",
            WorkItemKind::UserStory => "user_story",
            WorkItemKind::Task => "task",
            WorkItemKind::Test => "test",
            WorkItemKind::Bug => "bug",
        }
    }

    /// Kinds allowed as the parent of this kind.
    ///
    /// An empty slice means the kind only exists at the root (Epic).
    /// Bug is the one exception with two legal parents: it may sit under a
    /// UserStory or directly under a Feature.
    pub fn allowed_parents(&self) -> &'static [WorkItemKind] {
        match self {
            WorkItemKind::Epic => &[],
            WorkItemKind::Feature => &[WorkItemKind::Epic],
            WorkItemKind::UserStory => &[WorkItemKind::Feature],
            WorkItemKind::Task => &[WorkItemKind::UserStory],
            WorkItemKind::Test => &[WorkItemKind::UserStory],
            WorkItemKind::Bug => &[WorkItemKind::UserStory, WorkItemKind::Feature],
        }
    }

    /// Returns true if items of this kind may have children.
    pub fn may_have_children(&self) -> bool {
        !matches!(
            self,
            WorkItemKind::Task | WorkItemKind::Test | WorkItemKind::Bug
        )
    }

    /// Check whether `parent` is a legal parent kind for this kind.
    pub fn valid_parent(&self, parent: WorkItemKind) -> bool {
        self.allowed_parents().contains(&parent)
    }

    /// The leaf kinds that live directly under a user story.
    pub const USER_STORY_CHILDREN: [WorkItemKind; 3] = [
        WorkItemKind::Task,
        WorkItemKind::Test,
        WorkItemKind::Bug,
    ];
}

impl fmt::Display for WorkItemKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for WorkItemKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "epic" => Ok(WorkItemKind::Epic),
            "feature" => Ok(WorkItemKind::Feature),
            "user_story" => Ok(WorkItemKind::UserStory),
            "task" => Ok(WorkItemKind::Task),
            "test" => Ok(WorkItemKind::Test),
            "bug" => Ok(WorkItemKind::Bug),
            _ => Err(Error::InvalidKind(s.to_string())),
        }
    }
}

/// Ordered priority tiers. Everything strictly above [`Priority::Normal`]
/// counts as critical for the release guard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Normal,
    High,
    Urgent,
    Immediate,
}

impl Priority {
    /// Returns the string representation used in storage and display.
    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::Normal => "normal",
            Priority::High => "high",
            Priority::Urgent => "urgent",
            Priority::Immediate => "immediate",
        }
    }

    /// Returns true if this priority is strictly above the default tier.
    pub fn is_critical(&self) -> bool {
        *self > Priority::Normal
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Priority {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "normal" => Ok(Priority::Normal),
            "high" => Ok(Priority::High),
            "urgent" => Ok(Priority::Urgent),
            "immediate" => Ok(Priority::Immediate),
            _ => Err(Error::InvalidPriority(s.to_string())),
        }
    }
}

/// A workflow status drawn from the per-project status set.
///
/// Statuses are injected data, not a Rust enum: project setups vary, and the
/// engine only relies on the `is_closed` flag and `position` ordering.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Status {
    /// Database-assigned identifier.
    pub id: i64,
    /// Unique status name (e.g. "New", "In Progress", "Resolved").
    pub name: String,
    /// Whether this status counts as closed/terminal.
    pub is_closed: bool,
    /// Ordering position within the project's status set.
    pub position: i64,
}

/// Lifecycle state of a version record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VersionStatus {
    Open,
    Closed,
}

impl VersionStatus {
    /// Returns the string representation used in storage.
    pub fn as_str(&self) -> &'static str {
        match self {
            VersionStatus::Open => "open",
            VersionStatus::Closed => "closed",
        }
    }
}

impl fmt::Display for VersionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for VersionStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "open" => Ok(VersionStatus::Open),
            "closed" => Ok(VersionStatus::Closed),
            _ => Err(Error::InvalidVersionStatus(s.to_string())),
        }
    }
}

/// A release version that work items can be assigned to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Version {
    /// Database-assigned identifier.
    pub id: i64,
    /// Unique version name (e.g. "v1.0").
    pub name: String,
    /// Target release date; drives the date-aware cascade when present.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub effective_date: Option<NaiveDate>,
    /// Whether the version is still accepting work.
    pub status: VersionStatus,
}

/// Relation types between work items.
///
/// `blocks` is the only type the engine creates: a companion Test blocks its
/// user story until the test passes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RelationType {
    Blocks,
}

impl RelationType {
    /// Returns the string representation used in storage.
    pub fn as_str(&self) -> &'static str {
        match self {
            RelationType::Blocks => "blocks",
        }
    }
}

impl fmt::Display for RelationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for RelationType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "blocks" => Ok(RelationType::Blocks),
            _ => Err(Error::InvalidRelation(s.to_string())),
        }
    }
}

/// A typed directed edge between two work items.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Relation {
    /// The source work item ID.
    pub from_id: i64,
    /// The target work item ID.
    pub to_id: i64,
    /// The type of relationship.
    pub relation: RelationType,
    /// When the relation was created.
    pub created_at: DateTime<Utc>,
}

/// The primary entity representing a tracked work item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkItem {
    /// Database-assigned identifier.
    pub id: i64,
    /// Position in the hierarchy.
    pub kind: WorkItemKind,
    /// Short description of the work.
    pub subject: String,
    /// Longer description providing context.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Current workflow status (row in the project's status set).
    pub status_id: i64,
    /// Parent item, one level up only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<i64>,
    /// Assigned release version.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version_id: Option<i64>,
    /// Priority tier.
    pub priority: Priority,
    /// Scheduled start, set by the date-aware cascade.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_date: Option<NaiveDate>,
    /// Scheduled completion, set by the date-aware cascade.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due_date: Option<NaiveDate>,
    /// Person this item is assigned to.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assignee_id: Option<i64>,
    /// Monotonic counter for optimistic-concurrency checks.
    pub revision: i64,
    /// When the item was created.
    pub created_at: DateTime<Utc>,
    /// When the item was last modified.
    pub updated_at: DateTime<Utc>,
}

impl WorkItem {
    /// Fails with [`Error::NotUserStory`] unless this item is a user story.
    pub fn require_user_story(&self) -> Result<()> {
        if self.kind != WorkItemKind::UserStory {
            return Err(Error::NotUserStory {
                id: self.id,
                kind: self.kind,
            });
        }
        Ok(())
    }
}

/// Field set for creating a work item; the store assigns id, revision,
/// and timestamps.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewWorkItem {
    pub kind: WorkItemKind,
    pub subject: String,
    pub description: Option<String>,
    pub status_id: i64,
    pub parent_id: Option<i64>,
    pub version_id: Option<i64>,
    pub priority: Priority,
    pub start_date: Option<NaiveDate>,
    pub due_date: Option<NaiveDate>,
    pub assignee_id: Option<i64>,
}

impl NewWorkItem {
    /// Creates a new item description with default priority and no links.
    pub fn new(kind: WorkItemKind, subject: impl Into<String>, status_id: i64) -> Self {
        NewWorkItem {
            kind,
            subject: subject.into(),
            description: None,
            status_id,
            parent_id: None,
            version_id: None,
            priority: Priority::Normal,
            start_date: None,
            due_date: None,
            assignee_id: None,
        }
    }

    /// Sets the parent item (builder pattern).
    pub fn with_parent(mut self, parent_id: i64) -> Self {
        self.parent_id = Some(parent_id);
        self
    }

    /// Sets the description (builder pattern).
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Sets the version assignment (builder pattern).
    pub fn with_version(mut self, version_id: Option<i64>) -> Self {
        self.version_id = version_id;
        self
    }

    /// Sets the priority (builder pattern).
    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }

    /// Sets the assignee (builder pattern).
    pub fn with_assignee(mut self, assignee_id: Option<i64>) -> Self {
        self.assignee_id = assignee_id;
        self
    }
}

#[cfg(test)]
#[path = "item_tests.rs"]
mod tests;
