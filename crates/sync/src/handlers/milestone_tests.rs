// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

#![allow(clippy::unwrap_used)]

use tether_core::{Database, SyncStatus};

use super::*;
use crate::test_helpers::{link_project, milestone, MockFactory, MockTracker};

fn setup() -> (Database, std::sync::Arc<MockTracker>, MockFactory) {
    let db = Database::open_in_memory().unwrap();
    link_project(&db, 1);
    let tracker = MockTracker::new();
    let factory = MockFactory::new(tracker.clone());
    (db, tracker, factory)
}

#[tokio::test]
async fn test_create_links_and_persists() {
    let (db, tracker, factory) = setup();
    let mut subject = milestone(1, "v1.0");
    db.create_milestone(&mut subject).unwrap();

    MilestoneHandler::new(&db, &factory).create(&mut subject).await.unwrap();

    let number = subject.sync.external_id.unwrap();
    assert_eq!(tracker.milestone(number).unwrap().title, "v1.0");
    assert_eq!(subject.sync.status, SyncStatus::Synced);
    assert_eq!(db.get_milestone(subject.id).unwrap().sync.external_id, Some(number));
}

#[tokio::test]
async fn test_update_verifies_and_bumps_clock() {
    let (db, _tracker, factory) = setup();
    let handler = MilestoneHandler::new(&db, &factory);

    let mut subject = milestone(1, "v1.0");
    db.create_milestone(&mut subject).unwrap();
    handler.create(&mut subject).await.unwrap();
    let before = subject.sync.last_synced_at;

    handler.update(&mut subject).await.unwrap();
    assert!(subject.sync.last_synced_at >= before);
    assert_eq!(subject.sync.status, SyncStatus::Synced);
}

#[tokio::test]
async fn test_update_of_missing_milestone_marks_failed() {
    let (db, _tracker, factory) = setup();
    let mut subject = milestone(1, "phantom");
    subject.sync.mark_synced(77);
    db.create_milestone(&mut subject).unwrap();

    MilestoneHandler::new(&db, &factory).update(&mut subject).await.unwrap();

    assert_eq!(subject.sync.status, SyncStatus::SyncFailed);
    assert_eq!(db.get_milestone(subject.id).unwrap().sync.status, SyncStatus::SyncFailed);
}

#[tokio::test]
async fn test_delete_removes_external_milestone() {
    let (db, tracker, factory) = setup();
    let handler = MilestoneHandler::new(&db, &factory);

    let mut subject = milestone(1, "v1.0");
    db.create_milestone(&mut subject).unwrap();
    handler.create(&mut subject).await.unwrap();
    let number = subject.sync.external_id.unwrap();

    handler.delete(&mut subject).await.unwrap();
    assert!(tracker.milestone(number).is_none());
}

#[tokio::test]
async fn test_delete_of_missing_milestone_is_noop() {
    let (db, tracker, factory) = setup();
    let mut subject = milestone(1, "phantom");
    subject.sync.mark_synced(77);
    db.create_milestone(&mut subject).unwrap();

    MilestoneHandler::new(&db, &factory).delete(&mut subject).await.unwrap();
    // Only reads happened.
    assert!(tracker.calls().is_empty());
}
