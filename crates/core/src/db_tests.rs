// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Tests for the mirror database.

#![allow(clippy::unwrap_used)]

use chrono::{Duration as ChronoDuration, Utc};

use super::*;
use crate::comment::Comment;
use crate::issue::IssueStatus;
use crate::milestone::Milestone;
use crate::sync_state::SyncStatus;

fn test_db() -> Database {
    Database::open_in_memory().unwrap()
}

fn integration(project_id: i64, active: bool) -> IntegrationRecord {
    IntegrationRecord {
        id: 0,
        project_id,
        member_id: Some(1),
        repository: "octo/widgets".to_string(),
        token: "sealed".to_string(),
        active,
        created_at: Utc::now(),
    }
}

#[test]
fn test_issue_roundtrip() {
    let db = test_db();
    let mut issue = Issue::new(3, "Bug A");
    issue.body = Some("details".to_string());
    issue.assignee = Some(Assignee {
        member_id: 5,
        login: Some("octocat".to_string()),
    });

    let id = db.create_issue(&mut issue).unwrap();
    assert!(id > 0);

    let loaded = db.get_issue(id).unwrap();
    assert_eq!(loaded.title, "Bug A");
    assert_eq!(loaded.body.as_deref(), Some("details"));
    assert_eq!(loaded.status, IssueStatus::Todo);
    assert_eq!(loaded.assignee, issue.assignee);
    assert_eq!(loaded.sync.status, SyncStatus::NotSynced);
}

#[test]
fn test_get_issue_missing() {
    let db = test_db();
    assert!(matches!(db.get_issue(404), Err(Error::IssueNotFound(404))));
}

#[test]
fn test_issue_joins_milestone_external_id() {
    let db = test_db();
    let mut milestone = Milestone::new(3, "v1.0");
    milestone.sync.mark_synced(7);
    db.create_milestone(&mut milestone).unwrap();

    let mut issue = Issue::new(3, "Bug A");
    issue.milestone = Some(MilestoneRef {
        id: milestone.id,
        external_id: None, // ignored on write; read comes from the join
    });
    db.create_issue(&mut issue).unwrap();

    let loaded = db.get_issue(issue.id).unwrap();
    let ms = loaded.milestone.unwrap();
    assert_eq!(ms.id, milestone.id);
    assert_eq!(ms.external_id, Some(7));
}

#[test]
fn test_update_issue_keeps_sync_columns() {
    let db = test_db();
    let mut issue = Issue::new(3, "Bug A");
    db.create_issue(&mut issue).unwrap();
    db.save_sync_state(EntityKind::Issue, issue.id, &{
        let mut s = SyncState::default();
        s.mark_synced(11);
        s
    })
    .unwrap();

    let mut edited = db.get_issue(issue.id).unwrap();
    edited.title = "Bug A (edited)".to_string();
    edited.status = IssueStatus::Completed;
    db.update_issue(&edited).unwrap();

    let loaded = db.get_issue(issue.id).unwrap();
    assert_eq!(loaded.title, "Bug A (edited)");
    assert_eq!(loaded.status, IssueStatus::Completed);
    assert_eq!(loaded.sync.external_id, Some(11));
    assert_eq!(loaded.sync.status, SyncStatus::Synced);
}

#[test]
fn test_save_sync_state_missing_row() {
    let db = test_db();
    let err = db
        .save_sync_state(EntityKind::Milestone, 9, &SyncState::default())
        .unwrap_err();
    assert!(matches!(err, Error::MilestoneNotFound(9)));
}

#[test]
fn test_comment_joins_parent_issue() {
    let db = test_db();
    let mut issue = Issue::new(3, "Bug A");
    issue.sync.mark_synced(42);
    db.create_issue(&mut issue).unwrap();
    db.save_sync_state(EntityKind::Issue, issue.id, &issue.sync)
        .unwrap();

    let mut comment = Comment::new(
        5,
        "looks fixed",
        Some(IssueRef {
            id: issue.id,
            project_id: 0,      // ignored on write
            external_id: None,  // ignored on write
        }),
    );
    db.create_comment(&mut comment).unwrap();

    let loaded = db.get_comment(comment.id).unwrap();
    let issue_ref = loaded.issue.unwrap();
    assert_eq!(issue_ref.id, issue.id);
    assert_eq!(issue_ref.project_id, 3);
    assert_eq!(issue_ref.external_id, Some(42));
}

#[test]
fn test_detached_comment_has_no_issue_ref() {
    let db = test_db();
    let mut comment = Comment::new(5, "board note", None);
    db.create_comment(&mut comment).unwrap();

    let loaded = db.get_comment(comment.id).unwrap();
    assert!(loaded.issue.is_none());
}

#[test]
fn test_active_integration_lookup() {
    let db = test_db();
    assert!(db.active_integration(3).unwrap().is_none());

    let mut inactive = integration(3, false);
    db.create_integration(&mut inactive).unwrap();
    assert!(db.active_integration(3).unwrap().is_none());

    let mut active = integration(3, true);
    db.create_integration(&mut active).unwrap();

    let found = db.active_integration(3).unwrap().unwrap();
    assert_eq!(found.id, active.id);
    assert_eq!(found.repository, "octo/widgets");

    db.set_integration_active(active.id, false).unwrap();
    assert!(db.active_integration(3).unwrap().is_none());
}

#[test]
fn test_outbox_enqueue_and_due() {
    let db = test_db();
    let now = Utc::now();

    db.enqueue_job(EntityKind::Issue, 1, SyncOperation::Create, "{}", now)
        .unwrap();
    db.enqueue_job(
        EntityKind::Comment,
        2,
        SyncOperation::Delete,
        "{}",
        now + ChronoDuration::hours(1),
    )
    .unwrap();

    assert_eq!(db.outbox_len().unwrap(), 2);

    // Only the first job is due now
    let due = db.due_jobs(now, 10).unwrap();
    assert_eq!(due.len(), 1);
    assert_eq!(due[0].kind, EntityKind::Issue);
    assert_eq!(due[0].op, SyncOperation::Create);
    assert_eq!(due[0].attempts, 0);

    // Both due an hour from now
    let due = db.due_jobs(now + ChronoDuration::hours(2), 10).unwrap();
    assert_eq!(due.len(), 2);
}

#[test]
fn test_outbox_reschedule_and_remove() {
    let db = test_db();
    let now = Utc::now();
    let id = db
        .enqueue_job(EntityKind::Issue, 1, SyncOperation::Update, "{}", now)
        .unwrap();

    let later = now + ChronoDuration::minutes(5);
    db.reschedule_job(id, 3, later, "tracker timeout").unwrap();

    assert!(db.due_jobs(now, 10).unwrap().is_empty());
    let due = db.due_jobs(later, 10).unwrap();
    assert_eq!(due[0].attempts, 3);
    assert_eq!(due[0].last_error.as_deref(), Some("tracker timeout"));

    db.remove_job(id).unwrap();
    assert_eq!(db.outbox_len().unwrap(), 0);
}

#[test]
fn test_open_on_disk() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("mirror.db");

    {
        let db = Database::open(&path).unwrap();
        let mut issue = Issue::new(1, "persisted");
        db.create_issue(&mut issue).unwrap();
    }

    let db = Database::open(&path).unwrap();
    let issues = db.list_issues().unwrap();
    assert_eq!(issues.len(), 1);
    assert_eq!(issues[0].title, "persisted");
}
