// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::sync_state::{EntityKind, SyncOperation};

/// A pending sync operation, persisted in the same database as the entity
/// it mirrors so that enqueueing shares the caller's unit of work.
///
/// The payload is a JSON snapshot of the entity at enqueue time. Create and
/// update jobs re-read the live row before executing; delete jobs run from
/// the snapshot because the internal row is already gone.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutboxJob {
    pub id: i64,
    pub kind: EntityKind,
    pub entity_id: i64,
    pub op: SyncOperation,
    pub payload: String,
    /// Number of failed executions so far.
    pub attempts: u32,
    /// The job is due once this time has passed.
    pub next_attempt_at: DateTime<Utc>,
    pub last_error: Option<String>,
    pub created_at: DateTime<Utc>,
}
