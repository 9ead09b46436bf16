// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! SQLite-backed store for work items, statuses, versions, relations, and
//! the workflow graph.
//!
//! The [`Store`] struct is the engine's persistence boundary. Single-item
//! writes go through optimistic `revision` checks; multi-item writes
//! ([`Store::assign_version_bulk`], [`Store::apply_version_dates`],
//! [`Store::create_item_with_relation`]) run in one transaction, so a
//! failing sub-step rolls back everything written in the call.

use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;

use crate::error::{Error, Result};
use crate::item::{
    NewWorkItem, Relation, RelationType, Status, Version, VersionStatus, WorkItem, WorkItemKind,
};

/// SQL schema for the engine database.
pub const SCHEMA: &str = r#"
-- Per-project status set; is_closed drives completion checks
CREATE TABLE IF NOT EXISTS statuses (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL UNIQUE,
    is_closed INTEGER NOT NULL DEFAULT 0,
    position INTEGER NOT NULL
);

-- Release versions
CREATE TABLE IF NOT EXISTS versions (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL UNIQUE,
    effective_date TEXT,
    status TEXT NOT NULL DEFAULT 'open'
);

-- Work items with revision counter for optimistic concurrency
CREATE TABLE IF NOT EXISTS work_items (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    kind TEXT NOT NULL,
    subject TEXT NOT NULL,
    description TEXT,
    status_id INTEGER NOT NULL REFERENCES statuses(id),
    parent_id INTEGER REFERENCES work_items(id),
    version_id INTEGER REFERENCES versions(id),
    priority TEXT NOT NULL DEFAULT 'normal',
    start_date TEXT,
    due_date TEXT,
    assignee_id INTEGER,
    revision INTEGER NOT NULL DEFAULT 0,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

-- Typed directed relations between work items
CREATE TABLE IF NOT EXISTS relations (
    from_id INTEGER NOT NULL REFERENCES work_items(id),
    to_id INTEGER NOT NULL REFERENCES work_items(id),
    rel TEXT NOT NULL,
    created_at TEXT NOT NULL,
    PRIMARY KEY (from_id, to_id, rel),
    CHECK (from_id != to_id)
);

-- Legal status-to-status transitions, scoped to kind and role
CREATE TABLE IF NOT EXISTS workflow_transitions (
    kind TEXT NOT NULL,
    role TEXT NOT NULL,
    from_status INTEGER NOT NULL REFERENCES statuses(id),
    to_status INTEGER NOT NULL REFERENCES statuses(id),
    PRIMARY KEY (kind, role, from_status, to_status)
);

-- Indexes
CREATE INDEX IF NOT EXISTS idx_items_parent ON work_items(parent_id);
CREATE INDEX IF NOT EXISTS idx_items_status ON work_items(status_id);
CREATE INDEX IF NOT EXISTS idx_items_version ON work_items(version_id);
CREATE INDEX IF NOT EXISTS idx_relations_to ON relations(to_id);
"#;

/// Parse a string value from the database, returning a rusqlite error on
/// parse failure.
fn parse_db<T: std::str::FromStr>(
    value: &str,
    column: &str,
) -> std::result::Result<T, rusqlite::Error> {
    value.parse().map_err(|_| {
        rusqlite::Error::FromSqlConversionFailure(
            0,
            rusqlite::types::Type::Text,
            Box::new(Error::CorruptedData(format!(
                "invalid value '{value}' in column '{column}'"
            ))),
        )
    })
}

/// Parse an RFC3339 timestamp from the database.
fn parse_timestamp(
    value: &str,
    column: &str,
) -> std::result::Result<DateTime<Utc>, rusqlite::Error> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|_| {
            rusqlite::Error::FromSqlConversionFailure(
                0,
                rusqlite::types::Type::Text,
                Box::new(Error::CorruptedData(format!(
                    "invalid timestamp '{value}' in column '{column}'"
                ))),
            )
        })
}

/// Parse an optional ISO date from the database.
fn parse_date_opt(
    value: Option<String>,
    column: &str,
) -> std::result::Result<Option<NaiveDate>, rusqlite::Error> {
    match value {
        None => Ok(None),
        Some(s) => NaiveDate::parse_from_str(&s, "%Y-%m-%d")
            .map(Some)
            .map_err(|_| {
                rusqlite::Error::FromSqlConversionFailure(
                    0,
                    rusqlite::types::Type::Text,
                    Box::new(Error::CorruptedData(format!(
                        "invalid date '{s}' in column '{column}'"
                    ))),
                )
            }),
    }
}

/// Map a full work_items row (column order as in [`ITEM_COLUMNS`]).
fn item_from_row(row: &rusqlite::Row<'_>) -> std::result::Result<WorkItem, rusqlite::Error> {
    let kind_str: String = row.get(1)?;
    let priority_str: String = row.get(7)?;
    let start_str: Option<String> = row.get(8)?;
    let due_str: Option<String> = row.get(9)?;
    let created_str: String = row.get(12)?;
    let updated_str: String = row.get(13)?;

    Ok(WorkItem {
        id: row.get(0)?,
        kind: parse_db(&kind_str, "kind")?,
        subject: row.get(2)?,
        description: row.get(3)?,
        status_id: row.get(4)?,
        parent_id: row.get(5)?,
        version_id: row.get(6)?,
        priority: parse_db(&priority_str, "priority")?,
        start_date: parse_date_opt(start_str, "start_date")?,
        due_date: parse_date_opt(due_str, "due_date")?,
        assignee_id: row.get(10)?,
        revision: row.get(11)?,
        created_at: parse_timestamp(&created_str, "created_at")?,
        updated_at: parse_timestamp(&updated_str, "updated_at")?,
    })
}

const ITEM_COLUMNS: &str = "id, kind, subject, description, status_id, parent_id, version_id, \
     priority, start_date, due_date, assignee_id, revision, created_at, updated_at";

/// A single write of the date-aware version cascade.
///
/// [`Store::apply_version_dates`] applies a batch of these atomically.
#[derive(Debug, Clone, PartialEq)]
pub struct VersionDateWrite {
    pub id: i64,
    pub version_id: Option<i64>,
    pub start_date: Option<NaiveDate>,
    pub due_date: Option<NaiveDate>,
}

/// SQLite database connection with work-item store operations.
pub struct Store {
    /// The underlying SQLite connection.
    pub conn: Connection,
}

impl Store {
    /// Open a store at the given path, creating the schema if needed.
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            if !parent.exists() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let conn = Connection::open(path)?;
        conn.execute_batch(
            "PRAGMA foreign_keys = ON;
             PRAGMA journal_mode = WAL;
             PRAGMA busy_timeout = 5000;",
        )?;
        conn.execute_batch(SCHEMA)?;
        Ok(Store { conn })
    }

    /// Open an in-memory store (for testing).
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        conn.execute_batch(SCHEMA)?;
        Ok(Store { conn })
    }

    // --- statuses ---

    /// Create a status in the project's status set.
    pub fn create_status(&self, name: &str, is_closed: bool, position: i64) -> Result<Status> {
        self.conn.execute(
            "INSERT INTO statuses (name, is_closed, position) VALUES (?1, ?2, ?3)",
            params![name, is_closed, position],
        )?;
        Ok(Status {
            id: self.conn.last_insert_rowid(),
            name: name.to_string(),
            is_closed,
            position,
        })
    }

    /// Get a status by ID.
    pub fn status(&self, id: i64) -> Result<Status> {
        let status = self
            .conn
            .query_row(
                "SELECT id, name, is_closed, position FROM statuses WHERE id = ?1",
                params![id],
                |row| {
                    Ok(Status {
                        id: row.get(0)?,
                        name: row.get(1)?,
                        is_closed: row.get(2)?,
                        position: row.get(3)?,
                    })
                },
            )
            .optional()?;

        status.ok_or_else(|| Error::StatusNotFound(format!("#{id}")))
    }

    /// Look up a status by name, if it exists in the project's set.
    pub fn find_status_by_name(&self, name: &str) -> Result<Option<Status>> {
        let status = self
            .conn
            .query_row(
                "SELECT id, name, is_closed, position FROM statuses WHERE name = ?1",
                params![name],
                |row| {
                    Ok(Status {
                        id: row.get(0)?,
                        name: row.get(1)?,
                        is_closed: row.get(2)?,
                        position: row.get(3)?,
                    })
                },
            )
            .optional()?;
        Ok(status)
    }

    /// Get a status by name.
    pub fn status_by_name(&self, name: &str) -> Result<Status> {
        self.find_status_by_name(name)?
            .ok_or_else(|| Error::StatusNotFound(name.to_string()))
    }

    /// The lowest-positioned open status; the status new items start in.
    pub fn default_open_status(&self) -> Result<Status> {
        let status = self
            .conn
            .query_row(
                "SELECT id, name, is_closed, position FROM statuses
                 WHERE is_closed = 0 ORDER BY position LIMIT 1",
                [],
                |row| {
                    Ok(Status {
                        id: row.get(0)?,
                        name: row.get(1)?,
                        is_closed: row.get(2)?,
                        position: row.get(3)?,
                    })
                },
            )
            .optional()?;

        status.ok_or_else(|| Error::MissingConfiguration("no open status defined".to_string()))
    }

    // --- versions ---

    /// Create a version record.
    pub fn create_version(
        &self,
        name: &str,
        effective_date: Option<NaiveDate>,
        status: VersionStatus,
    ) -> Result<Version> {
        self.conn.execute(
            "INSERT INTO versions (name, effective_date, status) VALUES (?1, ?2, ?3)",
            params![
                name,
                effective_date.map(|d| d.to_string()),
                status.as_str()
            ],
        )?;
        Ok(Version {
            id: self.conn.last_insert_rowid(),
            name: name.to_string(),
            effective_date,
            status,
        })
    }

    /// Get a version by ID.
    pub fn version(&self, id: i64) -> Result<Version> {
        let version = self
            .conn
            .query_row(
                "SELECT id, name, effective_date, status FROM versions WHERE id = ?1",
                params![id],
                version_from_row,
            )
            .optional()?;

        version.ok_or(Error::VersionNotFound(id))
    }

    /// All dated versions, ordered by effective date.
    pub fn versions_by_date(&self) -> Result<Vec<Version>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, name, effective_date, status FROM versions
             WHERE effective_date IS NOT NULL ORDER BY effective_date, id",
        )?;

        let versions = stmt
            .query_map([], version_from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(versions)
    }

    /// The closest dated version strictly before the given one, if any.
    pub fn previous_version(&self, of: &Version) -> Result<Option<Version>> {
        let Some(date) = of.effective_date else {
            return Ok(None);
        };

        let version = self
            .conn
            .query_row(
                "SELECT id, name, effective_date, status FROM versions
                 WHERE effective_date IS NOT NULL AND effective_date < ?1
                 ORDER BY effective_date DESC, id DESC LIMIT 1",
                params![date.to_string()],
                version_from_row,
            )
            .optional()?;

        Ok(version)
    }

    // --- work items ---

    /// Create a work item, enforcing the hierarchy rules.
    pub fn create_item(&self, new: &NewWorkItem) -> Result<WorkItem> {
        self.validate_parent(new)?;
        let id = insert_item(&self.conn, new, &Utc::now().to_rfc3339())?;
        self.work_item(id)
    }

    /// Get a work item by ID.
    pub fn work_item(&self, id: i64) -> Result<WorkItem> {
        let sql = format!("SELECT {ITEM_COLUMNS} FROM work_items WHERE id = ?1");
        let item = self
            .conn
            .query_row(&sql, params![id], item_from_row)
            .optional()?;

        item.ok_or(Error::WorkItemNotFound(id))
    }

    /// Direct children of an item, optionally filtered by kind.
    ///
    /// An empty filter returns children of every kind. Results are ordered
    /// by ID for deterministic iteration.
    pub fn children_of(&self, parent_id: i64, kinds: &[WorkItemKind]) -> Result<Vec<WorkItem>> {
        let mut sql = format!("SELECT {ITEM_COLUMNS} FROM work_items WHERE parent_id = ?1");
        if !kinds.is_empty() {
            let placeholders = kinds
                .iter()
                .enumerate()
                .map(|(i, _)| format!("?{}", i + 2))
                .collect::<Vec<_>>()
                .join(", ");
            sql.push_str(&format!(" AND kind IN ({placeholders})"));
        }
        sql.push_str(" ORDER BY id");

        let mut params_vec: Vec<Box<dyn rusqlite::ToSql>> = vec![Box::new(parent_id)];
        for kind in kinds {
            params_vec.push(Box::new(kind.as_str().to_string()));
        }
        let params_refs: Vec<&dyn rusqlite::ToSql> =
            params_vec.iter().map(|p| p.as_ref()).collect();

        let mut stmt = self.conn.prepare(&sql)?;
        let items = stmt
            .query_map(params_refs.as_slice(), item_from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(items)
    }

    /// Update an item's status with an optimistic revision check.
    ///
    /// Bumps `revision` and refreshes `updated_at`. A stale `expected_revision`
    /// yields [`Error::StaleRevision`] and leaves the row untouched.
    pub fn update_status(&self, id: i64, status_id: i64, expected_revision: i64) -> Result<()> {
        let affected = self.conn.execute(
            "UPDATE work_items SET status_id = ?1, revision = revision + 1, updated_at = ?2
             WHERE id = ?3 AND revision = ?4",
            params![status_id, Utc::now().to_rfc3339(), id, expected_revision],
        )?;

        if affected == 0 {
            let actual: Option<i64> = self
                .conn
                .query_row(
                    "SELECT revision FROM work_items WHERE id = ?1",
                    params![id],
                    |row| row.get(0),
                )
                .optional()?;
            return match actual {
                None => Err(Error::WorkItemNotFound(id)),
                Some(actual) => Err(Error::StaleRevision {
                    id,
                    expected: expected_revision,
                    actual,
                }),
            };
        }
        Ok(())
    }

    /// Assign (or clear) a version on a set of items in one transaction.
    ///
    /// Every item gets a revision bump and a fresh `updated_at`. If any item
    /// is missing or any write fails, nothing is committed.
    pub fn assign_version_bulk(&mut self, ids: &[i64], version_id: Option<i64>) -> Result<()> {
        let now = Utc::now().to_rfc3339();
        let tx = self.conn.transaction()?;
        for &id in ids {
            let affected = tx.execute(
                "UPDATE work_items SET version_id = ?1, revision = revision + 1, updated_at = ?2
                 WHERE id = ?3",
                params![version_id, now, id],
            )?;
            if affected == 0 {
                return Err(Error::WorkItemNotFound(id));
            }
        }
        tx.commit()?;
        Ok(())
    }

    /// Apply a batch of version/date writes in one transaction.
    pub fn apply_version_dates(&mut self, writes: &[VersionDateWrite]) -> Result<()> {
        let now = Utc::now().to_rfc3339();
        let tx = self.conn.transaction()?;
        for write in writes {
            let affected = tx.execute(
                "UPDATE work_items SET version_id = ?1, start_date = ?2, due_date = ?3,
                 revision = revision + 1, updated_at = ?4 WHERE id = ?5",
                params![
                    write.version_id,
                    write.start_date.map(|d| d.to_string()),
                    write.due_date.map(|d| d.to_string()),
                    now,
                    write.id
                ],
            )?;
            if affected == 0 {
                return Err(Error::WorkItemNotFound(write.id));
            }
        }
        tx.commit()?;
        Ok(())
    }

    // --- relations ---

    /// Create a typed relation between two items.
    ///
    /// Self-relations and duplicate (from, to, type) triples are rejected
    /// with [`Error::RelationConflict`].
    pub fn create_relation(&self, from_id: i64, to_id: i64, rel: RelationType) -> Result<Relation> {
        insert_relation(&self.conn, from_id, to_id, rel, &Utc::now().to_rfc3339())
    }

    /// All relations originating from an item.
    pub fn relations_from(&self, from_id: i64) -> Result<Vec<Relation>> {
        let mut stmt = self.conn.prepare(
            "SELECT from_id, to_id, rel, created_at FROM relations WHERE from_id = ?1",
        )?;

        let relations = stmt
            .query_map(params![from_id], |row| {
                let rel_str: String = row.get(2)?;
                let created_str: String = row.get(3)?;
                Ok(Relation {
                    from_id: row.get(0)?,
                    to_id: row.get(1)?,
                    relation: parse_db(&rel_str, "rel")?,
                    created_at: parse_timestamp(&created_str, "created_at")?,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(relations)
    }

    /// Create an item and its `blocks` relation in one transaction.
    ///
    /// Used for companion generation: if the relation insert fails, the
    /// created item is rolled back too.
    pub fn create_item_with_relation(
        &mut self,
        new: &NewWorkItem,
        blocks_target: i64,
    ) -> Result<WorkItem> {
        self.validate_parent(new)?;
        self.work_item(blocks_target)?;

        let now = Utc::now().to_rfc3339();
        let tx = self.conn.transaction()?;
        let id = insert_item(&tx, new, &now)?;
        insert_relation(&tx, id, blocks_target, RelationType::Blocks, &now)?;
        tx.commit()?;

        self.work_item(id)
    }

    // --- workflow graph ---

    /// Add an edge to the legal-transition graph.
    pub fn add_workflow_transition(
        &self,
        kind: WorkItemKind,
        role: &str,
        from_status: i64,
        to_status: i64,
    ) -> Result<()> {
        self.conn.execute(
            "INSERT OR IGNORE INTO workflow_transitions (kind, role, from_status, to_status)
             VALUES (?1, ?2, ?3, ?4)",
            params![kind.as_str(), role, from_status, to_status],
        )?;
        Ok(())
    }

    /// Status IDs reachable from `from_status` for the given kind and role.
    pub fn reachable_statuses(
        &self,
        kind: WorkItemKind,
        from_status: i64,
        role: &str,
    ) -> Result<Vec<i64>> {
        let mut stmt = self.conn.prepare(
            "SELECT to_status FROM workflow_transitions
             WHERE kind = ?1 AND role = ?2 AND from_status = ?3 ORDER BY to_status",
        )?;

        let ids = stmt
            .query_map(params![kind.as_str(), role, from_status], |row| row.get(0))?
            .collect::<std::result::Result<Vec<i64>, _>>()?;

        Ok(ids)
    }

    /// Check that the new item's parent is legal for its kind.
    fn validate_parent(&self, new: &NewWorkItem) -> Result<()> {
        if let Some(parent_id) = new.parent_id {
            let parent = self.work_item(parent_id)?;
            if !new.kind.valid_parent(parent.kind) {
                return Err(Error::InvalidHierarchy {
                    child: new.kind,
                    parent: parent.kind,
                });
            }
        }
        Ok(())
    }
}

fn version_from_row(row: &rusqlite::Row<'_>) -> std::result::Result<Version, rusqlite::Error> {
    let date_str: Option<String> = row.get(2)?;
    let status_str: String = row.get(3)?;
    Ok(Version {
        id: row.get(0)?,
        name: row.get(1)?,
        effective_date: parse_date_opt(date_str, "effective_date")?,
        status: parse_db(&status_str, "status")?,
    })
}

/// Insert a work_items row; shared between the plain and transactional paths.
fn insert_item(conn: &Connection, new: &NewWorkItem, now: &str) -> Result<i64> {
    conn.execute(
        "INSERT INTO work_items (kind, subject, description, status_id, parent_id,
         version_id, priority, start_date, due_date, assignee_id, revision,
         created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, 0, ?11, ?11)",
        params![
            new.kind.as_str(),
            new.subject,
            new.description,
            new.status_id,
            new.parent_id,
            new.version_id,
            new.priority.as_str(),
            new.start_date.map(|d| d.to_string()),
            new.due_date.map(|d| d.to_string()),
            new.assignee_id,
            now,
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

/// Insert a relations row with conflict checks; shared with the
/// transactional companion path.
fn insert_relation(
    conn: &Connection,
    from_id: i64,
    to_id: i64,
    rel: RelationType,
    now: &str,
) -> Result<Relation> {
    if from_id == to_id {
        return Err(Error::RelationConflict {
            from: from_id,
            to: to_id,
            rel: rel.as_str().to_string(),
            cause: "self-relation",
        });
    }

    let exists: i64 = conn.query_row(
        "SELECT COUNT(*) FROM relations WHERE from_id = ?1 AND to_id = ?2 AND rel = ?3",
        params![from_id, to_id, rel.as_str()],
        |row| row.get(0),
    )?;
    if exists > 0 {
        return Err(Error::RelationConflict {
            from: from_id,
            to: to_id,
            rel: rel.as_str().to_string(),
            cause: "duplicate",
        });
    }

    conn.execute(
        "INSERT INTO relations (from_id, to_id, rel, created_at) VALUES (?1, ?2, ?3, ?4)",
        params![from_id, to_id, rel.as_str(), now],
    )?;

    let created_at = DateTime::parse_from_rfc3339(now)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|_| Error::CorruptedData(format!("invalid timestamp '{now}'")))?;

    Ok(Relation {
        from_id,
        to_id,
        relation: rel,
        created_at,
    })
}

#[cfg(test)]
#[path = "store_tests.rs"]
mod tests;
