// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use chrono::Utc;
use tracing::{debug, info, warn};

use tether_core::{Assignee, Database, EntityKind, Issue, SyncStatus};

use crate::error::SyncResult;
use crate::state;
use crate::tracker::{
    ClientFactory, IssueState, IssueUpdate, NewIssue, TrackerClient, TrackerError, TrackerIssue,
};

/// Marker prefixed to the external title when the internal issue is
/// deleted. The external side keeps the issue as an audit record.
pub const DELETED_MARKER: &str = "[삭제됨]";

/// Marker text of the audit comment left on soft-deleted issues. Also
/// how an existing audit comment is detected, so it must stay stable.
const DELETED_COMMENT: &str = "이 이슈는 그룹웨어에서 삭제되었습니다";

/// External tracker title length limit, in characters.
const TITLE_MAX: usize = 256;

pub struct IssueHandler<'a> {
    db: &'a Database,
    clients: &'a dyn ClientFactory,
}

impl<'a> IssueHandler<'a> {
    pub fn new(db: &'a Database, clients: &'a dyn ClientFactory) -> Self {
        Self { db, clients }
    }

    pub async fn create(&self, issue: &mut Issue) -> SyncResult<()> {
        let integration = super::active_integration(self.db, issue.project_id)?;
        let client = self.clients.client(&integration)?;

        let mut new = NewIssue {
            title: issue.title.clone(),
            body: issue.body.clone(),
            ..Default::default()
        };
        match &issue.assignee {
            Some(Assignee {
                login: Some(login), ..
            }) => new.assignee = Some(login.clone()),
            Some(Assignee {
                member_id,
                login: None,
            }) => {
                warn!(
                    issue = issue.id,
                    member = member_id,
                    "assignee has no tracker login; leaving unassigned"
                );
            }
            None => {}
        }
        // Only milestones that have themselves been mirrored can be
        // referenced on the external side.
        if let Some(milestone) = &issue.milestone {
            new.milestone = milestone.external_id;
        }

        let created = client.create_issue(new).await?;
        if issue.status.is_completed() && created.state == IssueState::Open {
            client
                .update_issue(created.number, IssueUpdate::close(), None)
                .await?;
        }

        state::mark_synced(issue, created.number, created.etag);
        self.db
            .save_sync_state(EntityKind::Issue, issue.id, &issue.sync)?;
        info!(issue = issue.id, number = created.number, "tracker issue created");
        Ok(())
    }

    pub async fn update(&self, issue: &mut Issue) -> SyncResult<()> {
        let Some(number) = issue.sync.external_id else {
            warn!(issue = issue.id, "update requested without an external id");
            return Ok(());
        };
        let integration = super::active_integration(self.db, issue.project_id)?;
        let client = self.clients.client(&integration)?;

        let remote = match client.get_issue(number).await {
            Ok(remote) => remote,
            Err(TrackerError::NotFound) => {
                // Deleted externally. Recreating here would resurrect it
                // behind the user's back, so flag it instead.
                warn!(issue = issue.id, number, "tracker issue is gone; not recreating");
                state::mark_sync_failed(issue, "tracker issue not found");
                self.db
                    .save_sync_state(EntityKind::Issue, issue.id, &issue.sync)?;
                return Ok(());
            }
            Err(e) => return Err(e.into()),
        };

        let update = diff(issue, &remote);
        if update.is_empty() {
            debug!(issue = issue.id, number, "mirror already current");
            issue.sync.touch();
            issue.sync.external_etag = remote.etag;
            self.db
                .save_sync_state(EntityKind::Issue, issue.id, &issue.sync)?;
            return Ok(());
        }

        let if_match = issue.sync.external_etag.clone();
        match client.update_issue(number, update, if_match).await {
            Ok(updated) => {
                issue.sync.touch();
                if updated.etag.is_some() {
                    issue.sync.external_etag = updated.etag;
                }
                self.db
                    .save_sync_state(EntityKind::Issue, issue.id, &issue.sync)?;
                info!(issue = issue.id, number, "tracker issue updated");
                Ok(())
            }
            Err(TrackerError::PreconditionFailed) => {
                warn!(issue = issue.id, number, "external issue changed underneath; flagging conflict");
                issue.sync.status = SyncStatus::Conflict;
                self.db
                    .save_sync_state(EntityKind::Issue, issue.id, &issue.sync)?;
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }

    /// External soft delete: close, mark the title, leave an audit
    /// comment. Idempotent, so a retried job finds nothing left to do.
    pub async fn delete(&self, issue: &mut Issue) -> SyncResult<()> {
        let Some(number) = issue.sync.external_id else {
            debug!(issue = issue.id, "skipping external delete: never synced");
            return Ok(());
        };
        let integration = super::active_integration(self.db, issue.project_id)?;
        let client = self.clients.client(&integration)?;

        let remote = match client.get_issue(number).await {
            Ok(remote) => remote,
            Err(TrackerError::NotFound) => {
                warn!(issue = issue.id, number, "tracker issue already gone");
                return Ok(());
            }
            Err(e) => return Err(e.into()),
        };

        if remote.state == IssueState::Open {
            client
                .update_issue(number, IssueUpdate::close(), None)
                .await?;
        }
        if !remote.title.starts_with(DELETED_MARKER) {
            client
                .update_issue(number, IssueUpdate::retitle(deleted_title(&remote.title)), None)
                .await?;
        }
        if !has_deletion_comment(client.as_ref(), number).await? {
            let stamp = Utc::now().format("%Y-%m-%d %H:%M:%S");
            client
                .create_comment(number, format!("{DELETED_COMMENT}. (삭제 시각: {stamp})"))
                .await?;
        }
        info!(issue = issue.id, number, "tracker issue marked deleted");
        Ok(())
    }
}

/// Fields that differ between the internal issue and the external
/// snapshot. Body is only pushed when the internal issue has one.
fn diff(issue: &Issue, remote: &TrackerIssue) -> IssueUpdate {
    let mut update = IssueUpdate::default();
    if issue.title != remote.title {
        update.title = Some(issue.title.clone());
    }
    if let Some(body) = &issue.body {
        if remote.body.as_deref() != Some(body) {
            update.body = Some(body.clone());
        }
    }
    let desired_state = if issue.status.is_completed() {
        IssueState::Closed
    } else {
        IssueState::Open
    };
    if desired_state != remote.state {
        update.state = Some(desired_state);
    }
    let desired_assignees: Vec<String> = issue
        .assignee
        .as_ref()
        .and_then(|a| a.login.clone())
        .into_iter()
        .collect();
    if desired_assignees != remote.assignees {
        update.assignees = Some(desired_assignees);
    }
    let desired_milestone = issue.milestone.as_ref().and_then(|m| m.external_id);
    if desired_milestone != remote.milestone {
        update.milestone = Some(desired_milestone);
    }
    update
}

/// Prefix the deletion marker, keeping the result within the external
/// title limit. Counts characters, not bytes; the marker is not ASCII.
fn deleted_title(current: &str) -> String {
    let marked = format!("{DELETED_MARKER} {current}");
    if marked.chars().count() <= TITLE_MAX {
        return marked;
    }
    let truncated: String = marked.chars().take(TITLE_MAX - 3).collect();
    format!("{truncated}...")
}

async fn has_deletion_comment(client: &dyn TrackerClient, number: i64) -> SyncResult<bool> {
    let comments = client.list_comments(number).await?;
    Ok(comments.iter().any(|c| c.body.contains(DELETED_COMMENT)))
}

#[cfg(test)]
#[path = "issue_tests.rs"]
mod tests;
