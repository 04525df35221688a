// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use serde::{Deserialize, Serialize};

/// Open/closed state of an external issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IssueState {
    Open,
    Closed,
}

/// An issue as the external tracker reports it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackerIssue {
    /// The tracker's issue number (the mirror's external id).
    pub number: i64,
    pub title: String,
    pub body: Option<String>,
    pub state: IssueState,
    /// Assignee logins, in tracker order.
    pub assignees: Vec<String>,
    /// Milestone number, when set.
    pub milestone: Option<i64>,
    /// ETag of the response that produced this snapshot, when the server
    /// sent one. Stored for conditional updates.
    pub etag: Option<String>,
}

/// Payload for creating an external issue.
#[derive(Debug, Clone, Default, Serialize)]
pub struct NewIssue {
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assignee: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub milestone: Option<i64>,
}

/// Field diff for updating an external issue. `None` means "leave as is";
/// the double option on `milestone` distinguishes clearing from leaving.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct IssueUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<IssueState>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assignees: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub milestone: Option<Option<i64>>,
}

impl IssueUpdate {
    /// An update that only closes the issue.
    pub fn close() -> Self {
        IssueUpdate {
            state: Some(IssueState::Closed),
            ..Default::default()
        }
    }

    /// An update that only changes the title.
    pub fn retitle(title: String) -> Self {
        IssueUpdate {
            title: Some(title),
            ..Default::default()
        }
    }

    /// True when no field would change.
    pub fn is_empty(&self) -> bool {
        *self == IssueUpdate::default()
    }
}

/// A milestone as the external tracker reports it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackerMilestone {
    /// The tracker's milestone number (the mirror's external id).
    pub number: i64,
    pub title: String,
}

/// An issue comment as the external tracker reports it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackerComment {
    /// The tracker's comment id (the mirror's external id).
    pub id: i64,
    pub body: String,
}

/// The bound repository, as reported by the tracker. Used to verify a
/// binding when an integration is connected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Repository {
    pub full_name: String,
    /// False when the repository has its issue tracker disabled, which
    /// makes every mirror operation fail.
    pub has_issues: bool,
}
