// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

#![allow(clippy::unwrap_used)]

use std::sync::Arc;

use chrono::Utc;
use tempfile::TempDir;

use tether_core::{Database, SyncOperation, SyncStatus};

use super::*;
use crate::handlers::{IssueHandler, DELETED_MARKER};
use crate::manager::SyncManager;
use crate::test_helpers::{issue, link_project, MockFactory, MockTracker};

fn worker_config() -> SyncConfig {
    SyncConfig {
        max_attempts: 3,
        ..SyncConfig::default()
    }
}

// The worker and the producers each hold their own connection to a
// shared database file, as they do in the daemon.
struct Rig {
    _dir: TempDir,
    db: Database,
    tracker: Arc<MockTracker>,
    worker: SyncWorker<MockFactory>,
}

fn setup() -> Rig {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("tether.db");
    let db = Database::open(&path).unwrap();
    link_project(&db, 1);
    let tracker = MockTracker::new();
    let worker = SyncWorker::new(
        Database::open(&path).unwrap(),
        MockFactory::new(tracker.clone()),
        &worker_config(),
    );
    Rig {
        _dir: dir,
        db,
        tracker,
        worker,
    }
}

#[tokio::test]
async fn test_drain_executes_create_job() {
    let rig = setup();
    let mut subject = issue(1, "queued work");
    rig.db.create_issue(&mut subject).unwrap();

    let manager = SyncManager::new(rig.db);
    manager.sync_to_tracker(&subject.clone().into(), SyncOperation::Create);

    assert_eq!(rig.worker.drain().await.unwrap(), 1);

    let reloaded = manager.db().get_issue(subject.id).unwrap();
    let number = reloaded.sync.external_id.unwrap();
    assert_eq!(reloaded.sync.status, SyncStatus::Synced);
    assert_eq!(rig.tracker.issue(number).unwrap().title, "queued work");
    assert_eq!(manager.db().outbox_len().unwrap(), 0);
}

#[tokio::test]
async fn test_transport_failure_reschedules_and_marks_failed() {
    let rig = setup();
    rig.tracker.set_fail_transport(true);

    let mut subject = issue(1, "unlucky");
    rig.db.create_issue(&mut subject).unwrap();
    let manager = SyncManager::new(rig.db);
    manager.sync_to_tracker(&subject.clone().into(), SyncOperation::Create);

    assert_eq!(rig.worker.drain().await.unwrap(), 1);

    // Still queued for retry, with the failure recorded on the entity.
    let db = manager.db();
    assert_eq!(db.outbox_len().unwrap(), 1);
    assert_eq!(db.get_issue(subject.id).unwrap().sync.status, SyncStatus::SyncFailed);
    let job = db
        .due_jobs(Utc::now() + chrono::Duration::hours(1), 10)
        .unwrap()
        .remove(0);
    assert_eq!(job.attempts, 1);
    assert!(job.last_error.is_some());

    // Once the tracker recovers, the retried job completes.
    rig.tracker.set_fail_transport(false);
    db.reschedule_job(job.id, job.attempts, Utc::now(), "retrying").unwrap();
    rig.worker.drain().await.unwrap();
    assert_eq!(db.outbox_len().unwrap(), 0);
    assert_eq!(db.get_issue(subject.id).unwrap().sync.status, SyncStatus::Synced);
}

#[tokio::test]
async fn test_job_is_dropped_after_max_attempts() {
    let rig = setup();
    rig.tracker.set_fail_transport(true);

    let mut subject = issue(1, "hopeless");
    rig.db.create_issue(&mut subject).unwrap();
    let manager = SyncManager::new(rig.db);
    manager.sync_to_tracker(&subject.into(), SyncOperation::Create);

    let db = manager.db();
    for _ in 0..worker_config().max_attempts {
        // Force the backoff aside so every drain picks the job up.
        if let Some(job) = db
            .due_jobs(Utc::now() + chrono::Duration::hours(24), 1)
            .unwrap()
            .pop()
        {
            db.reschedule_job(job.id, job.attempts, Utc::now(), "forced due").unwrap();
        }
        rig.worker.drain().await.unwrap();
    }
    assert_eq!(db.outbox_len().unwrap(), 0);
}

#[tokio::test]
async fn test_queued_creates_for_one_row_mirror_it_once() {
    let rig = setup();
    let mut subject = issue(1, "edited twice before drain");
    rig.db.create_issue(&mut subject).unwrap();

    // Both updates arrive while the row is unmirrored, so both route to
    // create. The first job mirrors the row; the second must not mint a
    // second external issue.
    let manager = SyncManager::new(rig.db);
    manager.sync_to_tracker(&subject.clone().into(), SyncOperation::Update);
    manager.sync_to_tracker(&subject.clone().into(), SyncOperation::Update);
    assert_eq!(manager.db().outbox_len().unwrap(), 2);

    assert_eq!(rig.worker.drain().await.unwrap(), 2);

    let creates = rig.tracker.calls().iter().filter(|c| *c == "create_issue").count();
    assert_eq!(creates, 1);
    let reloaded = manager.db().get_issue(subject.id).unwrap();
    assert_eq!(reloaded.sync.status, SyncStatus::Synced);
    assert_eq!(manager.db().outbox_len().unwrap(), 0);
}

#[tokio::test]
async fn test_delete_job_runs_from_snapshot() {
    let rig = setup();
    let mut subject = issue(1, "to be removed");
    rig.db.create_issue(&mut subject).unwrap();

    // Mirror it first so the delete has an external binding.
    let factory = MockFactory::new(rig.tracker.clone());
    IssueHandler::new(&rig.db, &factory).create(&mut subject).await.unwrap();
    let number = subject.sync.external_id.unwrap();

    let manager = SyncManager::new(rig.db);
    manager.sync_to_tracker(&subject.clone().into(), SyncOperation::Delete);
    // The internal row is gone by the time the worker runs.
    manager.db().delete_issue(subject.id).unwrap();

    rig.worker.drain().await.unwrap();

    let external = rig.tracker.issue(number).unwrap();
    assert!(external.title.starts_with(DELETED_MARKER));
    assert_eq!(manager.db().outbox_len().unwrap(), 0);
}

#[tokio::test]
async fn test_stale_job_for_vanished_row_is_dropped() {
    let rig = setup();
    let mut subject = issue(1, "short lived");
    rig.db.create_issue(&mut subject).unwrap();

    let manager = SyncManager::new(rig.db);
    manager.sync_to_tracker(&subject.clone().into(), SyncOperation::Create);
    manager.db().delete_issue(subject.id).unwrap();

    rig.worker.drain().await.unwrap();

    assert_eq!(manager.db().outbox_len().unwrap(), 0);
    assert!(rig.tracker.calls().is_empty());
}

#[tokio::test]
async fn test_backfill_after_integration_activates() {
    let rig = setup();
    // Project 2 is not linked yet, so the create produces no job.
    let mut subject = issue(2, "predates the integration");
    rig.db.create_issue(&mut subject).unwrap();
    let manager = SyncManager::new(rig.db);
    manager.sync_to_tracker(&subject.clone().into(), SyncOperation::Create);
    assert_eq!(manager.db().outbox_len().unwrap(), 0);

    // Once linked, an ordinary update backfills the row as a create.
    link_project(manager.db(), 2);
    manager.sync_to_tracker(&subject.clone().into(), SyncOperation::Update);
    rig.worker.drain().await.unwrap();

    let reloaded = manager.db().get_issue(subject.id).unwrap();
    assert_eq!(reloaded.sync.status, SyncStatus::Synced);
    let number = reloaded.sync.external_id.unwrap();
    assert_eq!(rig.tracker.issue(number).unwrap().title, "predates the integration");
}

#[tokio::test]
async fn test_run_stops_on_shutdown() {
    let rig = setup();

    // The receiver has not observed the flipped value yet, so the loop
    // exits on its first pass instead of sleeping out a poll interval.
    let (tx, rx) = tokio::sync::watch::channel(false);
    tx.send(true).unwrap();
    rig.worker.run(rx).await;
}
