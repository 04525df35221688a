// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Entry point for the mirror path.
//!
//! Domain code calls [`SyncManager::sync_to_tracker`] after committing a
//! mutation. The manager checks eligibility, routes the operation, and
//! enqueues a durable job; the worker performs the network calls later.
//! Nothing here ever surfaces an error to the caller. Sync is best
//! effort and the internal mutation has already succeeded.

use tracing::{debug, error};

use tether_core::{Database, SyncOperation, Syncable};

use crate::entity::SyncEntity;
use crate::extractor;
use crate::outbox::{Outbox, RetryPolicy};

pub struct SyncManager {
    db: Database,
    policy: RetryPolicy,
}

impl SyncManager {
    pub fn new(db: Database) -> Self {
        Self::with_policy(db, RetryPolicy::default())
    }

    pub fn with_policy(db: Database, policy: RetryPolicy) -> Self {
        Self { db, policy }
    }

    pub fn db(&self) -> &Database {
        &self.db
    }

    /// Queue a mirror job for a committed mutation. Infallible by
    /// contract: ineligible entities are skipped and queue failures are
    /// logged and swallowed.
    pub fn sync_to_tracker(&self, entity: &SyncEntity, op: SyncOperation) {
        let kind = entity.kind();
        let id = entity.id();

        let Some(project_id) = extractor::project_id(entity) else {
            debug!(%kind, id, "skipping sync: entity belongs to no project");
            return;
        };
        let integration = match self.db.active_integration(project_id) {
            Ok(Some(integration)) => integration,
            Ok(None) => {
                debug!(%kind, id, project_id, "skipping sync: project is not linked");
                return;
            }
            Err(e) => {
                error!(%kind, id, project_id, error = %e, "integration lookup failed; skipping sync");
                return;
            }
        };

        let routed = match op {
            SyncOperation::Create => SyncOperation::Create,
            SyncOperation::Update if entity.sync().is_synced => SyncOperation::Update,
            // An update on a row that predates the integration backfills
            // it as a create.
            SyncOperation::Update => SyncOperation::Create,
            SyncOperation::Delete if entity.sync().is_synced => SyncOperation::Delete,
            SyncOperation::Delete => {
                debug!(%kind, id, "skipping delete sync: nothing external to remove");
                return;
            }
        };

        let outbox = Outbox::new(&self.db, self.policy.clone());
        match outbox.enqueue(entity, routed) {
            Ok(job) => {
                debug!(%kind, id, op = %routed, job, repository = %integration.repository, "sync job enqueued");
            }
            Err(e) => {
                error!(%kind, id, op = %routed, error = %e, "failed to enqueue sync job");
            }
        }
    }
}

#[cfg(test)]
#[path = "manager_tests.rs"]
mod tests;
