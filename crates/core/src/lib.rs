// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! rk-core: hierarchical workflow and propagation engine for a release
//! kanban board.
//!
//! Work items form a fixed four-level hierarchy
//! (Epic → Feature → UserStory → {Task, Test, Bug}). This crate implements
//! the rules that sit between a board UI and the store:
//!
//! - [`transition`] - maps a kanban column move onto a validated status
//!   change, honoring the per-kind, per-role workflow graph
//! - [`guard`] - the three-layer release readiness gate over a user story's
//!   children, with a logged forced-bypass path
//! - [`propagation`] - cascades version (and computed start/due date)
//!   assignments through the hierarchy, atomically
//! - [`companion`] - idempotently materializes the Test item paired with a
//!   user story via a `blocks` relation
//!
//! The HTTP, rendering, and permission layers live elsewhere; services take
//! a [`Store`] plus an explicit [`Actor`] and return plain result values.
//!
//! # Example
//!
//! ```rust,ignore
//! use rk_core::{transition, Actor, Column, ColumnMap, Store};
//!
//! let mut store = Store::open(Path::new("board.db"))?;
//! let map = ColumnMap::default();
//! let actor = Actor::new(7, "developer");
//! let moved = transition::to_column(&store, item_id, Column::InProgress, &map, &actor)?;
//! ```

pub mod column;
pub mod companion;
pub mod error;
pub mod guard;
pub mod item;
pub mod propagation;
pub mod store;
pub mod transition;
pub mod workflow;

pub use column::{Column, ColumnMap};
pub use error::{Error, Result};
pub use item::{
    NewWorkItem, Priority, Relation, RelationType, Status, Version, VersionStatus, WorkItem,
    WorkItemKind,
};
pub use store::{Store, VersionDateWrite};
pub use workflow::{Actor, WorkflowTransition};
