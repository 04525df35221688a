// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use tether_core::{Comment, EntityKind, Issue, Milestone, SyncState, Syncable};

/// The closed sum of entities the sync layer mirrors.
///
/// Serializes with a `kind` tag so outbox payload snapshots round-trip.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SyncEntity {
    Issue(Issue),
    Milestone(Milestone),
    Comment(Comment),
}

impl Syncable for SyncEntity {
    fn id(&self) -> i64 {
        match self {
            SyncEntity::Issue(i) => i.id,
            SyncEntity::Milestone(m) => m.id,
            SyncEntity::Comment(c) => c.id,
        }
    }

    fn kind(&self) -> EntityKind {
        match self {
            SyncEntity::Issue(_) => EntityKind::Issue,
            SyncEntity::Milestone(_) => EntityKind::Milestone,
            SyncEntity::Comment(_) => EntityKind::Comment,
        }
    }

    fn updated_at(&self) -> DateTime<Utc> {
        match self {
            SyncEntity::Issue(i) => i.updated_at,
            SyncEntity::Milestone(m) => m.updated_at,
            SyncEntity::Comment(c) => c.updated_at,
        }
    }

    fn sync(&self) -> &SyncState {
        match self {
            SyncEntity::Issue(i) => &i.sync,
            SyncEntity::Milestone(m) => &m.sync,
            SyncEntity::Comment(c) => &c.sync,
        }
    }

    fn sync_mut(&mut self) -> &mut SyncState {
        match self {
            SyncEntity::Issue(i) => &mut i.sync,
            SyncEntity::Milestone(m) => &mut m.sync,
            SyncEntity::Comment(c) => &mut c.sync,
        }
    }
}

impl From<Issue> for SyncEntity {
    fn from(issue: Issue) -> Self {
        SyncEntity::Issue(issue)
    }
}

impl From<Milestone> for SyncEntity {
    fn from(milestone: Milestone) -> Self {
        SyncEntity::Milestone(milestone)
    }
}

impl From<Comment> for SyncEntity {
    fn from(comment: Comment) -> Self {
        SyncEntity::Comment(comment)
    }
}
