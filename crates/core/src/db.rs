// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! SQLite-backed database for mirrored project entities.
//!
//! The [`Database`] struct provides all data access for issues, milestones,
//! issue comments, integration records, and the sync outbox. Sync-state
//! columns live on the entity rows themselves; the outbox shares the same
//! database file so enqueueing a sync job joins the caller's unit of work.

use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::time::Duration;

use crate::comment::{Comment, IssueRef};
use crate::error::{Error, Result};
use crate::integration::IntegrationRecord;
use crate::issue::{Assignee, Issue, MilestoneRef};
use crate::milestone::Milestone;
use crate::outbox::OutboxJob;
use crate::sync_state::{EntityKind, SyncOperation, SyncState};

/// SQL schema for the mirror database.
pub const SCHEMA: &str = r#"
-- Milestones carry their own sync columns
CREATE TABLE IF NOT EXISTS milestones (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    project_id INTEGER NOT NULL,
    name TEXT NOT NULL,
    description TEXT,
    due_on TEXT,
    completed INTEGER NOT NULL DEFAULT 0,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL,
    external_id INTEGER,
    is_synced INTEGER NOT NULL DEFAULT 0,
    last_synced_at TEXT,
    external_etag TEXT,
    sync_status TEXT NOT NULL DEFAULT 'not_synced'
);

CREATE TABLE IF NOT EXISTS issues (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    project_id INTEGER NOT NULL,
    title TEXT NOT NULL,
    body TEXT,
    status TEXT NOT NULL DEFAULT 'todo',
    assignee_member_id INTEGER,
    assignee_login TEXT,
    milestone_id INTEGER REFERENCES milestones(id),
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL,
    external_id INTEGER,
    is_synced INTEGER NOT NULL DEFAULT 0,
    last_synced_at TEXT,
    external_etag TEXT,
    sync_status TEXT NOT NULL DEFAULT 'not_synced'
);

-- Comments attach to issues; detached comments are never mirrored
CREATE TABLE IF NOT EXISTS comments (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    issue_id INTEGER REFERENCES issues(id),
    author_member_id INTEGER NOT NULL,
    body TEXT NOT NULL,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL,
    external_id INTEGER,
    is_synced INTEGER NOT NULL DEFAULT 0,
    last_synced_at TEXT,
    external_etag TEXT,
    sync_status TEXT NOT NULL DEFAULT 'not_synced'
);

-- Project-to-repository bindings; at most one active per project
CREATE TABLE IF NOT EXISTS integrations (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    project_id INTEGER NOT NULL,
    member_id INTEGER,
    repository TEXT NOT NULL,
    token TEXT NOT NULL,
    active INTEGER NOT NULL DEFAULT 1,
    created_at TEXT NOT NULL
);

-- Durable sync jobs (outbox pattern)
CREATE TABLE IF NOT EXISTS sync_outbox (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    kind TEXT NOT NULL,
    entity_id INTEGER NOT NULL,
    op TEXT NOT NULL,
    payload TEXT NOT NULL,
    attempts INTEGER NOT NULL DEFAULT 0,
    next_attempt_at TEXT NOT NULL,
    last_error TEXT,
    created_at TEXT NOT NULL
);

-- Indexes
CREATE UNIQUE INDEX IF NOT EXISTS idx_integrations_active
    ON integrations(project_id) WHERE active = 1;
CREATE INDEX IF NOT EXISTS idx_issues_project ON issues(project_id);
CREATE INDEX IF NOT EXISTS idx_milestones_project ON milestones(project_id);
CREATE INDEX IF NOT EXISTS idx_comments_issue ON comments(issue_id);
CREATE INDEX IF NOT EXISTS idx_outbox_due ON sync_outbox(next_attempt_at);
"#;

/// Parse a string value from the database, returning a rusqlite error on parse failure.
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

/// Parse an RFC 3339 timestamp stored as text.
fn parse_ts(value: &str, column: &str) -> std::result::Result<DateTime<Utc>, rusqlite::Error> {
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

fn parse_opt_ts(
    value: Option<String>,
    column: &str,
) -> std::result::Result<Option<DateTime<Utc>>, rusqlite::Error> {
    match value {
        Some(s) => Ok(Some(parse_ts(&s, column)?)),
        None => Ok(None),
    }
}

/// Read the five sync columns starting at `idx`:
/// external_id, is_synced, last_synced_at, external_etag, sync_status.
fn sync_from_row(row: &rusqlite::Row<'_>, idx: usize) -> rusqlite::Result<SyncState> {
    let status: String = row.get(idx + 4)?;
    Ok(SyncState {
        external_id: row.get(idx)?,
        is_synced: row.get(idx + 1)?,
        last_synced_at: parse_opt_ts(row.get(idx + 2)?, "last_synced_at")?,
        external_etag: row.get(idx + 3)?,
        status: parse_db(&status, "sync_status")?,
    })
}

/// All data access for the mirror store.
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open (and initialize) the database at the given path.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Database> {
        let conn = Connection::open(path)?;
        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.pragma_update(None, "foreign_keys", "ON")?;
        conn.busy_timeout(Duration::from_millis(5000))?;
        conn.execute_batch(SCHEMA)?;
        Ok(Database { conn })
    }

    /// Open an in-memory database (unit tests).
    pub fn open_in_memory() -> Result<Database> {
        let conn = Connection::open_in_memory()?;
        conn.pragma_update(None, "foreign_keys", "ON")?;
        conn.execute_batch(SCHEMA)?;
        Ok(Database { conn })
    }

    // ----- issues -----

    /// Insert a new issue, assigning its id.
    pub fn create_issue(&self, issue: &mut Issue) -> Result<i64> {
        self.conn.execute(
            "INSERT INTO issues (project_id, title, body, status, assignee_member_id,
                 assignee_login, milestone_id, created_at, updated_at, external_id,
                 is_synced, last_synced_at, external_etag, sync_status)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)",
            params![
                issue.project_id,
                issue.title,
                issue.body,
                issue.status.as_str(),
                issue.assignee.as_ref().map(|a| a.member_id),
                issue.assignee.as_ref().and_then(|a| a.login.clone()),
                issue.milestone.as_ref().map(|m| m.id),
                issue.created_at.to_rfc3339(),
                issue.updated_at.to_rfc3339(),
                issue.sync.external_id,
                issue.sync.is_synced,
                issue.sync.last_synced_at.map(|t| t.to_rfc3339()),
                issue.sync.external_etag,
                issue.sync.status.as_str(),
            ],
        )?;
        issue.id = self.conn.last_insert_rowid();
        Ok(issue.id)
    }

    /// Load an issue, joining the milestone's external number for the
    /// tracker payload.
    pub fn get_issue(&self, id: i64) -> Result<Issue> {
        self.conn
            .query_row(
                "SELECT i.id, i.project_id, i.title, i.body, i.status,
                        i.assignee_member_id, i.assignee_login, i.milestone_id,
                        m.external_id, i.created_at, i.updated_at,
                        i.external_id, i.is_synced, i.last_synced_at,
                        i.external_etag, i.sync_status
                 FROM issues i
                 LEFT JOIN milestones m ON m.id = i.milestone_id
                 WHERE i.id = ?1",
                params![id],
                |row| {
                    let status: String = row.get(4)?;
                    let created: String = row.get(9)?;
                    let updated: String = row.get(10)?;
                    let assignee = match row.get::<_, Option<i64>>(5)? {
                        Some(member_id) => Some(Assignee {
                            member_id,
                            login: row.get(6)?,
                        }),
                        None => None,
                    };
                    let milestone = match row.get::<_, Option<i64>>(7)? {
                        Some(ms_id) => Some(MilestoneRef {
                            id: ms_id,
                            external_id: row.get(8)?,
                        }),
                        None => None,
                    };
                    Ok(Issue {
                        id: row.get(0)?,
                        project_id: row.get(1)?,
                        title: row.get(2)?,
                        body: row.get(3)?,
                        status: parse_db(&status, "status")?,
                        assignee,
                        milestone,
                        created_at: parse_ts(&created, "created_at")?,
                        updated_at: parse_ts(&updated, "updated_at")?,
                        sync: sync_from_row(row, 11)?,
                    })
                },
            )
            .optional()?
            .ok_or(Error::IssueNotFound(id))
    }

    /// Update an issue's domain fields (not its sync columns).
    pub fn update_issue(&self, issue: &Issue) -> Result<()> {
        self.conn.execute(
            "UPDATE issues SET title = ?1, body = ?2, status = ?3,
                 assignee_member_id = ?4, assignee_login = ?5, milestone_id = ?6,
                 updated_at = ?7
             WHERE id = ?8",
            params![
                issue.title,
                issue.body,
                issue.status.as_str(),
                issue.assignee.as_ref().map(|a| a.member_id),
                issue.assignee.as_ref().and_then(|a| a.login.clone()),
                issue.milestone.as_ref().map(|m| m.id),
                Utc::now().to_rfc3339(),
                issue.id,
            ],
        )?;
        if self.conn.changes() == 0 {
            return Err(Error::IssueNotFound(issue.id));
        }
        Ok(())
    }

    pub fn delete_issue(&self, id: i64) -> Result<()> {
        self.conn
            .execute("DELETE FROM issues WHERE id = ?1", params![id])?;
        if self.conn.changes() == 0 {
            return Err(Error::IssueNotFound(id));
        }
        Ok(())
    }

    /// All issues, for the reconciliation sweep.
    pub fn list_issues(&self) -> Result<Vec<Issue>> {
        let ids: Vec<i64> = self
            .conn
            .prepare("SELECT id FROM issues ORDER BY id")?
            .query_map([], |row| row.get(0))?
            .collect::<std::result::Result<_, _>>()?;
        ids.into_iter().map(|id| self.get_issue(id)).collect()
    }

    // ----- milestones -----

    /// Insert a new milestone, assigning its id.
    pub fn create_milestone(&self, milestone: &mut Milestone) -> Result<i64> {
        self.conn.execute(
            "INSERT INTO milestones (project_id, name, description, due_on, completed,
                 created_at, updated_at, external_id, is_synced, last_synced_at,
                 external_etag, sync_status)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
            params![
                milestone.project_id,
                milestone.name,
                milestone.description,
                milestone.due_on.map(|d| d.format("%Y-%m-%d").to_string()),
                milestone.completed,
                milestone.created_at.to_rfc3339(),
                milestone.updated_at.to_rfc3339(),
                milestone.sync.external_id,
                milestone.sync.is_synced,
                milestone.sync.last_synced_at.map(|t| t.to_rfc3339()),
                milestone.sync.external_etag,
                milestone.sync.status.as_str(),
            ],
        )?;
        milestone.id = self.conn.last_insert_rowid();
        Ok(milestone.id)
    }

    pub fn get_milestone(&self, id: i64) -> Result<Milestone> {
        self.conn
            .query_row(
                "SELECT id, project_id, name, description, due_on, completed,
                        created_at, updated_at, external_id, is_synced,
                        last_synced_at, external_etag, sync_status
                 FROM milestones WHERE id = ?1",
                params![id],
                |row| {
                    let due: Option<String> = row.get(4)?;
                    let created: String = row.get(6)?;
                    let updated: String = row.get(7)?;
                    Ok(Milestone {
                        id: row.get(0)?,
                        project_id: row.get(1)?,
                        name: row.get(2)?,
                        description: row.get(3)?,
                        due_on: match due {
                            Some(d) => Some(
                                NaiveDate::parse_from_str(&d, "%Y-%m-%d")
                                    .map_err(|_| {
                                        rusqlite::Error::FromSqlConversionFailure(
                                            0,
                                            rusqlite::types::Type::Text,
                                            Box::new(Error::CorruptedData(format!(
                                                "invalid date '{d}' in column 'due_on'"
                                            ))),
                                        )
                                    })?,
                            ),
                            None => None,
                        },
                        completed: row.get(5)?,
                        created_at: parse_ts(&created, "created_at")?,
                        updated_at: parse_ts(&updated, "updated_at")?,
                        sync: sync_from_row(row, 8)?,
                    })
                },
            )
            .optional()?
            .ok_or(Error::MilestoneNotFound(id))
    }

    /// Update a milestone's domain fields (not its sync columns).
    pub fn update_milestone(&self, milestone: &Milestone) -> Result<()> {
        self.conn.execute(
            "UPDATE milestones SET name = ?1, description = ?2, due_on = ?3,
                 completed = ?4, updated_at = ?5
             WHERE id = ?6",
            params![
                milestone.name,
                milestone.description,
                milestone.due_on.map(|d| d.format("%Y-%m-%d").to_string()),
                milestone.completed,
                Utc::now().to_rfc3339(),
                milestone.id,
            ],
        )?;
        if self.conn.changes() == 0 {
            return Err(Error::MilestoneNotFound(milestone.id));
        }
        Ok(())
    }

    pub fn delete_milestone(&self, id: i64) -> Result<()> {
        self.conn
            .execute("DELETE FROM milestones WHERE id = ?1", params![id])?;
        if self.conn.changes() == 0 {
            return Err(Error::MilestoneNotFound(id));
        }
        Ok(())
    }

    /// All milestones, for the reconciliation sweep.
    pub fn list_milestones(&self) -> Result<Vec<Milestone>> {
        let ids: Vec<i64> = self
            .conn
            .prepare("SELECT id FROM milestones ORDER BY id")?
            .query_map([], |row| row.get(0))?
            .collect::<std::result::Result<_, _>>()?;
        ids.into_iter().map(|id| self.get_milestone(id)).collect()
    }

    // ----- comments -----

    /// Insert a new comment, assigning its id.
    pub fn create_comment(&self, comment: &mut Comment) -> Result<i64> {
        self.conn.execute(
            "INSERT INTO comments (issue_id, author_member_id, body, created_at,
                 updated_at, external_id, is_synced, last_synced_at, external_etag,
                 sync_status)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
            params![
                comment.issue.as_ref().map(|i| i.id),
                comment.author_member_id,
                comment.body,
                comment.created_at.to_rfc3339(),
                comment.updated_at.to_rfc3339(),
                comment.sync.external_id,
                comment.sync.is_synced,
                comment.sync.last_synced_at.map(|t| t.to_rfc3339()),
                comment.sync.external_etag,
                comment.sync.status.as_str(),
            ],
        )?;
        comment.id = self.conn.last_insert_rowid();
        Ok(comment.id)
    }

    /// Load a comment, joining the parent issue's project and external
    /// number (everything comment sync needs from the issue).
    pub fn get_comment(&self, id: i64) -> Result<Comment> {
        self.conn
            .query_row(
                "SELECT c.id, c.issue_id, i.project_id, i.external_id,
                        c.author_member_id, c.body, c.created_at, c.updated_at,
                        c.external_id, c.is_synced, c.last_synced_at,
                        c.external_etag, c.sync_status
                 FROM comments c
                 LEFT JOIN issues i ON i.id = c.issue_id
                 WHERE c.id = ?1",
                params![id],
                |row| {
                    let created: String = row.get(6)?;
                    let updated: String = row.get(7)?;
                    let issue = match row.get::<_, Option<i64>>(1)? {
                        Some(issue_id) => Some(IssueRef {
                            id: issue_id,
                            project_id: row.get::<_, Option<i64>>(2)?.unwrap_or(0),
                            external_id: row.get(3)?,
                        }),
                        None => None,
                    };
                    Ok(Comment {
                        id: row.get(0)?,
                        author_member_id: row.get(4)?,
                        body: row.get(5)?,
                        issue,
                        created_at: parse_ts(&created, "created_at")?,
                        updated_at: parse_ts(&updated, "updated_at")?,
                        sync: sync_from_row(row, 8)?,
                    })
                },
            )
            .optional()?
            .ok_or(Error::CommentNotFound(id))
    }

    /// Update a comment's domain fields (not its sync columns).
    pub fn update_comment(&self, comment: &Comment) -> Result<()> {
        self.conn.execute(
            "UPDATE comments SET body = ?1, updated_at = ?2 WHERE id = ?3",
            params![comment.body, Utc::now().to_rfc3339(), comment.id],
        )?;
        if self.conn.changes() == 0 {
            return Err(Error::CommentNotFound(comment.id));
        }
        Ok(())
    }

    pub fn delete_comment(&self, id: i64) -> Result<()> {
        self.conn
            .execute("DELETE FROM comments WHERE id = ?1", params![id])?;
        if self.conn.changes() == 0 {
            return Err(Error::CommentNotFound(id));
        }
        Ok(())
    }

    /// All comments, for the reconciliation sweep.
    pub fn list_comments(&self) -> Result<Vec<Comment>> {
        let ids: Vec<i64> = self
            .conn
            .prepare("SELECT id FROM comments ORDER BY id")?
            .query_map([], |row| row.get(0))?
            .collect::<std::result::Result<_, _>>()?;
        ids.into_iter().map(|id| self.get_comment(id)).collect()
    }

    // ----- sync state -----

    /// Persist an entity's sync columns after a state transition.
    pub fn save_sync_state(&self, kind: EntityKind, id: i64, sync: &SyncState) -> Result<()> {
        let table = match kind {
            EntityKind::Issue => "issues",
            EntityKind::Milestone => "milestones",
            EntityKind::Comment => "comments",
        };
        self.conn.execute(
            &format!(
                "UPDATE {table} SET external_id = ?1, is_synced = ?2,
                     last_synced_at = ?3, external_etag = ?4, sync_status = ?5
                 WHERE id = ?6"
            ),
            params![
                sync.external_id,
                sync.is_synced,
                sync.last_synced_at.map(|t| t.to_rfc3339()),
                sync.external_etag,
                sync.status.as_str(),
                id,
            ],
        )?;
        if self.conn.changes() == 0 {
            return Err(match kind {
                EntityKind::Issue => Error::IssueNotFound(id),
                EntityKind::Milestone => Error::MilestoneNotFound(id),
                EntityKind::Comment => Error::CommentNotFound(id),
            });
        }
        Ok(())
    }

    // ----- integrations -----

    /// Insert an integration record, assigning its id.
    pub fn create_integration(&self, record: &mut IntegrationRecord) -> Result<i64> {
        self.conn.execute(
            "INSERT INTO integrations (project_id, member_id, repository, token,
                 active, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                record.project_id,
                record.member_id,
                record.repository,
                record.token,
                record.active,
                record.created_at.to_rfc3339(),
            ],
        )?;
        record.id = self.conn.last_insert_rowid();
        Ok(record.id)
    }

    /// The active integration for a project, or `None` when the project
    /// was never linked (the normal case for most projects).
    pub fn active_integration(&self, project_id: i64) -> Result<Option<IntegrationRecord>> {
        Ok(self
            .conn
            .query_row(
                "SELECT id, project_id, member_id, repository, token, active, created_at
                 FROM integrations
                 WHERE project_id = ?1 AND active = 1",
                params![project_id],
                |row| {
                    let created: String = row.get(6)?;
                    Ok(IntegrationRecord {
                        id: row.get(0)?,
                        project_id: row.get(1)?,
                        member_id: row.get(2)?,
                        repository: row.get(3)?,
                        token: row.get(4)?,
                        active: row.get(5)?,
                        created_at: parse_ts(&created, "created_at")?,
                    })
                },
            )
            .optional()?)
    }

    /// Flip an integration's active flag (owned by the integration
    /// management service; exposed here for its use).
    pub fn set_integration_active(&self, id: i64, active: bool) -> Result<()> {
        self.conn.execute(
            "UPDATE integrations SET active = ?1 WHERE id = ?2",
            params![active, id],
        )?;
        Ok(())
    }

    // ----- outbox -----

    /// Append a sync job, due immediately unless scheduled later.
    pub fn enqueue_job(
        &self,
        kind: EntityKind,
        entity_id: i64,
        op: SyncOperation,
        payload: &str,
        next_attempt_at: DateTime<Utc>,
    ) -> Result<i64> {
        self.conn.execute(
            "INSERT INTO sync_outbox (kind, entity_id, op, payload, attempts,
                 next_attempt_at, created_at)
             VALUES (?1, ?2, ?3, ?4, 0, ?5, ?6)",
            params![
                kind.as_str(),
                entity_id,
                op.as_str(),
                payload,
                next_attempt_at.to_rfc3339(),
                Utc::now().to_rfc3339(),
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    /// Jobs whose next attempt is due, oldest first.
    pub fn due_jobs(&self, now: DateTime<Utc>, limit: usize) -> Result<Vec<OutboxJob>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, kind, entity_id, op, payload, attempts, next_attempt_at,
                    last_error, created_at
             FROM sync_outbox
             WHERE next_attempt_at <= ?1
             ORDER BY id
             LIMIT ?2",
        )?;
        let jobs = stmt
            .query_map(params![now.to_rfc3339(), limit as i64], |row| {
                let kind: String = row.get(1)?;
                let op: String = row.get(3)?;
                let next: String = row.get(6)?;
                let created: String = row.get(8)?;
                Ok(OutboxJob {
                    id: row.get(0)?,
                    kind: parse_db(&kind, "kind")?,
                    entity_id: row.get(2)?,
                    op: parse_db(&op, "op")?,
                    payload: row.get(4)?,
                    attempts: row.get(5)?,
                    next_attempt_at: parse_ts(&next, "next_attempt_at")?,
                    last_error: row.get(7)?,
                    created_at: parse_ts(&created, "created_at")?,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(jobs)
    }

    /// Push a failed job back with its new attempt count and due time.
    pub fn reschedule_job(
        &self,
        id: i64,
        attempts: u32,
        next_attempt_at: DateTime<Utc>,
        last_error: &str,
    ) -> Result<()> {
        self.conn.execute(
            "UPDATE sync_outbox SET attempts = ?1, next_attempt_at = ?2, last_error = ?3
             WHERE id = ?4",
            params![attempts, next_attempt_at.to_rfc3339(), last_error, id],
        )?;
        if self.conn.changes() == 0 {
            return Err(Error::JobNotFound(id));
        }
        Ok(())
    }

    /// Remove a completed (or abandoned) job.
    pub fn remove_job(&self, id: i64) -> Result<()> {
        self.conn
            .execute("DELETE FROM sync_outbox WHERE id = ?1", params![id])?;
        Ok(())
    }

    /// Number of pending jobs.
    pub fn outbox_len(&self) -> Result<usize> {
        let count: i64 =
            self.conn
                .query_row("SELECT COUNT(*) FROM sync_outbox", [], |row| row.get(0))?;
        Ok(count as usize)
    }
}

#[cfg(test)]
#[path = "db_tests.rs"]
mod tests;
