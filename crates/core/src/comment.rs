// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::sync_state::{EntityKind, SyncState, Syncable};

/// The slice of the parent issue a comment needs for mirroring: which
/// project owns it and whether the issue itself has been mirrored yet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssueRef {
    pub id: i64,
    pub project_id: i64,
    pub external_id: Option<i64>,
}

/// A comment on an issue, mirrored to an external tracker issue comment.
///
/// Comments can also live on boards and chats; those carry `issue: None`
/// and are never mirrored.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Comment {
    /// Internal primary key.
    pub id: i64,
    pub author_member_id: i64,
    pub body: String,
    /// Parent issue, when the comment is attached to one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub issue: Option<IssueRef>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Mirror state against the external tracker. `external_id` here is
    /// the tracker's comment id, not an issue number.
    pub sync: SyncState,
}

impl Syncable for Comment {
    fn id(&self) -> i64 {
        self.id
    }

    fn kind(&self) -> EntityKind {
        EntityKind::Comment
    }

    fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    fn sync(&self) -> &SyncState {
        &self.sync
    }

    fn sync_mut(&mut self) -> &mut SyncState {
        &mut self.sync
    }
}

impl Comment {
    /// Test helper: construct an unsynced comment attached to an issue.
    #[cfg(test)]
    pub fn new(author_member_id: i64, body: &str, issue: Option<IssueRef>) -> Self {
        let now = Utc::now();
        Comment {
            id: 0,
            author_member_id,
            body: body.to_string(),
            issue,
            created_at: now,
            updated_at: now,
            sync: SyncState::default(),
        }
    }
}
