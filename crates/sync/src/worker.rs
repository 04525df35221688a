// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Background worker that executes queued mirror jobs.
//!
//! The worker polls the outbox, runs the handler matching each job's
//! entity kind and operation, and either completes or reschedules the
//! job. Create and update jobs re-read the current row so they push the
//! latest state; delete jobs run from the snapshot taken at enqueue
//! time, since the internal row is already gone.

use std::time::Duration;

use tokio::sync::watch;
use tracing::{debug, error, info, warn};

use tether_core::{Database, EntityKind, OutboxJob, SyncOperation, Syncable};

use crate::config::SyncConfig;
use crate::entity::SyncEntity;
use crate::error::SyncResult;
use crate::handlers::{CommentHandler, IssueHandler, MilestoneHandler};
use crate::outbox::{Disposition, Outbox, RetryPolicy};
use crate::state;
use crate::tracker::ClientFactory;

pub struct SyncWorker<F> {
    db: Database,
    clients: F,
    policy: RetryPolicy,
    poll_interval: Duration,
    batch_size: usize,
}

impl<F: ClientFactory> SyncWorker<F> {
    pub fn new(db: Database, clients: F, config: &SyncConfig) -> Self {
        Self {
            db,
            clients,
            policy: config.retry_policy(),
            poll_interval: config.poll_interval(),
            batch_size: config.batch_size,
        }
    }

    /// Poll loop. Returns when the shutdown channel flips.
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) {
        info!(poll_ms = self.poll_interval.as_millis() as u64, "sync worker started");
        loop {
            tokio::select! {
                _ = tokio::time::sleep(self.poll_interval) => {
                    match self.drain().await {
                        Ok(0) => {}
                        Ok(n) => debug!(jobs = n, "outbox drained"),
                        Err(e) => error!(error = %e, "outbox drain failed"),
                    }
                }
                _ = shutdown.changed() => {
                    info!("sync worker stopping");
                    return;
                }
            }
        }
    }

    /// Run every currently-due job once. Returns how many were picked up.
    pub async fn drain(&self) -> SyncResult<usize> {
        let outbox = Outbox::new(&self.db, self.policy.clone());
        let jobs = outbox.due(self.batch_size)?;
        let count = jobs.len();
        for job in jobs {
            match self.execute(&job).await {
                Ok(()) => outbox.complete(&job)?,
                Err(e) => {
                    warn!(
                        job = job.id,
                        kind = %job.kind,
                        entity = job.entity_id,
                        op = %job.op,
                        error = %e,
                        "sync job failed"
                    );
                    self.record_failure(&job, &e.to_string());
                    match outbox.fail(&job, &e.to_string())? {
                        Disposition::Retry { next_attempt_at } => {
                            debug!(job = job.id, %next_attempt_at, "sync job rescheduled");
                        }
                        Disposition::Dropped => {
                            error!(
                                job = job.id,
                                kind = %job.kind,
                                entity = job.entity_id,
                                "sync job dropped after max attempts"
                            );
                        }
                    }
                }
            }
        }
        Ok(count)
    }

    async fn execute(&self, job: &OutboxJob) -> SyncResult<()> {
        let Some(entity) = self.load(job)? else {
            debug!(
                job = job.id,
                kind = %job.kind,
                entity = job.entity_id,
                "entity row is gone; dropping stale job"
            );
            return Ok(());
        };
        // The operation was routed against the state at enqueue time. An
        // earlier job may have mirrored the row since, so a create whose
        // row is now synced runs as an update; repeating the create would
        // mint a second external copy.
        let op = if job.op == SyncOperation::Create && entity.sync().is_synced {
            debug!(job = job.id, entity = job.entity_id, "row already mirrored; create becomes update");
            SyncOperation::Update
        } else {
            job.op
        };
        match entity {
            SyncEntity::Issue(mut issue) => {
                let handler = IssueHandler::new(&self.db, &self.clients);
                match op {
                    SyncOperation::Create => handler.create(&mut issue).await,
                    SyncOperation::Update => handler.update(&mut issue).await,
                    SyncOperation::Delete => handler.delete(&mut issue).await,
                }
            }
            SyncEntity::Milestone(mut milestone) => {
                let handler = MilestoneHandler::new(&self.db, &self.clients);
                match op {
                    SyncOperation::Create => handler.create(&mut milestone).await,
                    SyncOperation::Update => handler.update(&mut milestone).await,
                    SyncOperation::Delete => handler.delete(&mut milestone).await,
                }
            }
            SyncEntity::Comment(mut comment) => {
                let handler = CommentHandler::new(&self.db, &self.clients);
                match op {
                    SyncOperation::Create => handler.create(&mut comment).await,
                    SyncOperation::Update => handler.update(&mut comment).await,
                    SyncOperation::Delete => handler.delete(&mut comment).await,
                }
            }
        }
    }

    /// The entity a job should operate on: the live row for create and
    /// update, the enqueue-time snapshot for delete. `None` means the
    /// row vanished after enqueue and the job is obsolete.
    fn load(&self, job: &OutboxJob) -> SyncResult<Option<SyncEntity>> {
        if job.op == SyncOperation::Delete {
            return Ok(Some(serde_json::from_str(&job.payload)?));
        }
        let entity = match job.kind {
            EntityKind::Issue => match self.db.get_issue(job.entity_id) {
                Ok(issue) => Some(SyncEntity::Issue(issue)),
                Err(tether_core::Error::IssueNotFound(_)) => None,
                Err(e) => return Err(e.into()),
            },
            EntityKind::Milestone => match self.db.get_milestone(job.entity_id) {
                Ok(milestone) => Some(SyncEntity::Milestone(milestone)),
                Err(tether_core::Error::MilestoneNotFound(_)) => None,
                Err(e) => return Err(e.into()),
            },
            EntityKind::Comment => match self.db.get_comment(job.entity_id) {
                Ok(comment) => Some(SyncEntity::Comment(comment)),
                Err(tether_core::Error::CommentNotFound(_)) => None,
                Err(e) => return Err(e.into()),
            },
        };
        Ok(entity)
    }

    /// Best-effort `SyncFailed` marking for a job that errored. Delete
    /// jobs have no row left to mark, and a marking failure must not
    /// mask the original error.
    fn record_failure(&self, job: &OutboxJob, reason: &str) {
        if job.op == SyncOperation::Delete {
            return;
        }
        let Ok(Some(mut entity)) = self.load(job) else {
            return;
        };
        state::mark_sync_failed(&mut entity, reason);
        if let Err(e) = self
            .db
            .save_sync_state(job.kind, job.entity_id, entity.sync())
        {
            warn!(job = job.id, error = %e, "could not persist failure status");
        }
    }
}

#[cfg(test)]
#[path = "worker_tests.rs"]
mod tests;
