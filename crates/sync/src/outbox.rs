// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Durable retry queue for tracker mirror jobs.
//!
//! Jobs are rows in the same SQLite database as the entities they
//! mirror, so enqueueing shares the caller's transaction boundary and
//! survives restarts. The payload is a JSON snapshot of the entity at
//! enqueue time; delete jobs run from it after the internal row is gone.

use std::time::Duration;

use chrono::{TimeDelta, Utc};

use tether_core::{Database, OutboxJob, SyncOperation};

use crate::entity::SyncEntity;
use crate::error::SyncResult;

/// Backoff schedule for failed jobs.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Attempts before a job is dropped.
    pub max_attempts: u32,
    /// Delay before the first retry; doubles on each failure.
    pub initial_delay_ms: u64,
    /// Ceiling on the computed delay.
    pub max_delay_secs: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 8,
            initial_delay_ms: 500,
            max_delay_secs: 300,
        }
    }
}

impl RetryPolicy {
    /// Delay before the next attempt, given how many have failed so far.
    pub fn delay_after(&self, attempts: u32) -> Duration {
        let shift = attempts.saturating_sub(1).min(16);
        let ms = self
            .initial_delay_ms
            .saturating_mul(1u64 << shift)
            .min(self.max_delay_secs.saturating_mul(1000));
        Duration::from_millis(ms)
    }
}

/// What [`Outbox::fail`] decided to do with a failed job.
#[derive(Debug, PartialEq, Eq)]
pub enum Disposition {
    /// Rescheduled with backoff.
    Retry { next_attempt_at: chrono::DateTime<Utc> },
    /// Attempts exhausted; removed from the queue.
    Dropped,
}

/// Queue facade over the `sync_outbox` table.
pub struct Outbox<'a> {
    db: &'a Database,
    policy: RetryPolicy,
}

impl<'a> Outbox<'a> {
    pub fn new(db: &'a Database, policy: RetryPolicy) -> Self {
        Self { db, policy }
    }

    /// Persist a job due immediately, snapshotting the entity as JSON.
    pub fn enqueue(&self, entity: &SyncEntity, op: SyncOperation) -> SyncResult<i64> {
        use tether_core::Syncable;
        let payload = serde_json::to_string(entity)?;
        let id = self
            .db
            .enqueue_job(entity.kind(), entity.id(), op, &payload, Utc::now())?;
        Ok(id)
    }

    /// Jobs whose `next_attempt_at` has passed, oldest first.
    pub fn due(&self, limit: usize) -> SyncResult<Vec<OutboxJob>> {
        Ok(self.db.due_jobs(Utc::now(), limit)?)
    }

    /// Remove a job that ran to completion.
    pub fn complete(&self, job: &OutboxJob) -> SyncResult<()> {
        self.db.remove_job(job.id)?;
        Ok(())
    }

    /// Reschedule a failed job with backoff, or drop it once attempts
    /// are exhausted.
    pub fn fail(&self, job: &OutboxJob, error: &str) -> SyncResult<Disposition> {
        let attempts = job.attempts + 1;
        if attempts >= self.policy.max_attempts {
            self.db.remove_job(job.id)?;
            return Ok(Disposition::Dropped);
        }
        let delay = self.policy.delay_after(attempts);
        let delta = TimeDelta::milliseconds(delay.as_millis().min(i64::MAX as u128) as i64);
        let next_attempt_at = Utc::now() + delta;
        self.db
            .reschedule_job(job.id, attempts, next_attempt_at, error)?;
        Ok(Disposition::Retry { next_attempt_at })
    }

    pub fn len(&self) -> SyncResult<usize> {
        Ok(self.db.outbox_len()?)
    }

    pub fn is_empty(&self) -> SyncResult<bool> {
        Ok(self.len()? == 0)
    }
}

#[cfg(test)]
#[path = "outbox_tests.rs"]
mod tests;
