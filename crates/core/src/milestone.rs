// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::sync_state::{EntityKind, SyncState, Syncable};

/// A project milestone, mirrored to an external tracker milestone.
///
/// Only the name crosses the wire on create; due date and description are
/// internal-only fields the tracker payload ignores.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Milestone {
    /// Internal primary key.
    pub id: i64,
    /// Owning project.
    pub project_id: i64,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due_on: Option<NaiveDate>,
    pub completed: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Mirror state against the external tracker.
    pub sync: SyncState,
}

impl Syncable for Milestone {
    fn id(&self) -> i64 {
        self.id
    }

    fn kind(&self) -> EntityKind {
        EntityKind::Milestone
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

impl Milestone {
    /// Test helper: construct an unsynced milestone with current timestamps.
    #[cfg(test)]
    pub fn new(project_id: i64, name: &str) -> Self {
        let now = Utc::now();
        Milestone {
            id: 0,
            project_id,
            name: name.to_string(),
            description: None,
            due_on: None,
            completed: false,
            created_at: now,
            updated_at: now,
            sync: SyncState::default(),
        }
    }
}
