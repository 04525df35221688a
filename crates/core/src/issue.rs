// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};
use crate::sync_state::{EntityKind, SyncState, Syncable};

/// Workflow status of an issue.
///
/// The external mirror derives its open/closed state from this:
/// `Completed` maps to closed, everything else to open.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueStatus {
    /// Not yet started. Initial state for new issues.
    Todo,
    /// Currently being worked on.
    InProgress,
    /// Finished; mirrored as a closed tracker issue.
    Completed,
}

impl IssueStatus {
    /// Returns the string representation used in storage and display.
    pub fn as_str(&self) -> &'static str {
        match self {
            IssueStatus::Todo => "todo",
            IssueStatus::InProgress => "in_progress",
            IssueStatus::Completed => "completed",
        }
    }

    /// True when the issue should be closed on the external tracker.
    pub fn is_completed(&self) -> bool {
        matches!(self, IssueStatus::Completed)
    }
}

impl fmt::Display for IssueStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for IssueStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "todo" => Ok(IssueStatus::Todo),
            "in_progress" => Ok(IssueStatus::InProgress),
            "completed" => Ok(IssueStatus::Completed),
            _ => Err(Error::InvalidIssueStatus(s.to_string())),
        }
    }
}

/// Assignee of an issue, with the external tracker login the member maps
/// to. The login is absent when the member never linked a tracker account;
/// the sync layer leaves the external issue unassigned in that case.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Assignee {
    pub member_id: i64,
    pub login: Option<String>,
}

/// Reference to the milestone an issue belongs to, carrying the
/// milestone's external number when it has been mirrored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MilestoneRef {
    pub id: i64,
    pub external_id: Option<i64>,
}

/// A tracked work item, mirrored to an external tracker issue.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Issue {
    /// Internal primary key.
    pub id: i64,
    /// Owning project.
    pub project_id: i64,
    /// Short description of the work.
    pub title: String,
    /// Longer description providing context.
    pub body: Option<String>,
    /// Current workflow state.
    pub status: IssueStatus,
    /// Assigned member, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assignee: Option<Assignee>,
    /// Milestone this issue belongs to, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub milestone: Option<MilestoneRef>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Mirror state against the external tracker.
    pub sync: SyncState,
}

impl Syncable for Issue {
    fn id(&self) -> i64 {
        self.id
    }

    fn kind(&self) -> EntityKind {
        EntityKind::Issue
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

impl Issue {
    /// Test helper: construct an unsynced issue with current timestamps.
    /// Production code loads issues from the database.
    #[cfg(test)]
    pub fn new(project_id: i64, title: &str) -> Self {
        let now = Utc::now();
        Issue {
            id: 0,
            project_id,
            title: title.to_string(),
            body: None,
            status: IssueStatus::Todo,
            assignee: None,
            milestone: None,
            created_at: now,
            updated_at: now,
            sync: SyncState::default(),
        }
    }
}

#[cfg(test)]
#[path = "issue_tests.rs"]
mod tests;
