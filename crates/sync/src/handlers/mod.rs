// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Per-entity mirror handlers.
//!
//! One handler per entity kind, each exposing `create`/`update`/`delete`.
//! Handlers run on the worker, resolve the active integration, build a
//! client through the factory, talk to the tracker, and persist the
//! resulting sync state transition. Typed `NotFound` outcomes are
//! absorbed here; transport failures propagate so the outbox retries.

mod comment;
mod issue;
mod milestone;

pub use comment::CommentHandler;
pub use issue::{IssueHandler, DELETED_MARKER};
pub use milestone::MilestoneHandler;

use tether_core::{Database, IntegrationRecord};

use crate::error::{SyncError, SyncResult};

/// The active integration for a project. By the time a handler runs the
/// manager has already vetted eligibility, so absence here is an error
/// (the integration was disconnected while the job sat in the queue).
pub(crate) fn active_integration(db: &Database, project_id: i64) -> SyncResult<IntegrationRecord> {
    db.active_integration(project_id)?
        .ok_or(SyncError::NoActiveIntegration(project_id))
}
