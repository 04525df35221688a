// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use tracing::{debug, info, warn};

use tether_core::{Comment, Database, EntityKind, IssueRef};

use crate::error::SyncResult;
use crate::state;
use crate::tracker::{ClientFactory, TrackerClient, TrackerComment};

pub struct CommentHandler<'a> {
    db: &'a Database,
    clients: &'a dyn ClientFactory,
}

impl<'a> CommentHandler<'a> {
    pub fn new(db: &'a Database, clients: &'a dyn ClientFactory) -> Self {
        Self { db, clients }
    }

    pub async fn create(&self, comment: &mut Comment) -> SyncResult<()> {
        let Some((issue, issue_number)) = synced_parent(comment) else {
            return Ok(());
        };
        let integration = super::active_integration(self.db, issue.project_id)?;
        let client = self.clients.client(&integration)?;

        let created = client
            .create_comment(issue_number, comment.body.clone())
            .await?;
        state::mark_synced(comment, created.id, None);
        self.db
            .save_sync_state(EntityKind::Comment, comment.id, &comment.sync)?;
        info!(comment = comment.id, external = created.id, "tracker comment created");
        Ok(())
    }

    pub async fn update(&self, comment: &mut Comment) -> SyncResult<()> {
        let Some((issue, issue_number)) = synced_parent(comment) else {
            return Ok(());
        };
        let Some(external_id) = comment.sync.external_id else {
            warn!(comment = comment.id, "update requested without an external id");
            return Ok(());
        };
        let integration = super::active_integration(self.db, issue.project_id)?;
        let client = self.clients.client(&integration)?;

        match find_comment(client.as_ref(), issue_number, external_id).await? {
            Some(_) => {
                client
                    .update_comment(external_id, comment.body.clone())
                    .await?;
                comment.sync.touch();
                self.db
                    .save_sync_state(EntityKind::Comment, comment.id, &comment.sync)?;
                info!(comment = comment.id, external = external_id, "tracker comment updated");
            }
            None => {
                // Deleted externally; repost under a fresh external id.
                warn!(
                    comment = comment.id,
                    external = external_id,
                    "tracker comment is gone; recreating"
                );
                let created = client
                    .create_comment(issue_number, comment.body.clone())
                    .await?;
                state::mark_synced(comment, created.id, None);
                self.db
                    .save_sync_state(EntityKind::Comment, comment.id, &comment.sync)?;
            }
        }
        Ok(())
    }

    pub async fn delete(&self, comment: &mut Comment) -> SyncResult<()> {
        let Some((issue, issue_number)) = synced_parent(comment) else {
            return Ok(());
        };
        let Some(external_id) = comment.sync.external_id else {
            debug!(comment = comment.id, "skipping external delete: never synced");
            return Ok(());
        };
        let integration = super::active_integration(self.db, issue.project_id)?;
        let client = self.clients.client(&integration)?;

        match find_comment(client.as_ref(), issue_number, external_id).await? {
            Some(_) => {
                client.delete_comment(external_id).await?;
                info!(comment = comment.id, external = external_id, "tracker comment deleted");
            }
            None => {
                warn!(comment = comment.id, external = external_id, "tracker comment already gone");
            }
        }
        Ok(())
    }
}

/// The comment's parent issue, when there is one and it has been
/// mirrored. Comments on detached or unsynced issues are skipped.
fn synced_parent(comment: &Comment) -> Option<(&IssueRef, i64)> {
    let Some(issue) = &comment.issue else {
        debug!(comment = comment.id, "skipping sync: comment has no issue");
        return None;
    };
    let Some(issue_number) = issue.external_id else {
        debug!(
            comment = comment.id,
            issue = issue.id,
            "skipping sync: parent issue is not mirrored"
        );
        return None;
    };
    Some((issue, issue_number))
}

/// The tracker has no fetch-by-id for comments, so existence checks scan
/// the issue's comment list.
async fn find_comment(
    client: &dyn TrackerClient,
    issue_number: i64,
    comment_id: i64,
) -> SyncResult<Option<TrackerComment>> {
    let comments = client.list_comments(issue_number).await?;
    Ok(comments.into_iter().find(|c| c.id == comment_id))
}

#[cfg(test)]
#[path = "comment_tests.rs"]
mod tests;
