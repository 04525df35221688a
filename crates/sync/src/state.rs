// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Kind-independent sync state transitions.
//!
//! These helpers operate on anything [`Syncable`] and only mutate the
//! entity in memory; persisting the new state is the caller's job (the
//! handlers write through [`Database::save_sync_state`]).

use tracing::{error, info, warn};

use tether_core::{Database, EntityKind, Result, SyncStatus, Syncable};

/// Record a successful create round trip: external id, synced flag,
/// timestamp, status, and the response etag when one was captured.
pub fn mark_synced(entity: &mut dyn Syncable, external_id: i64, etag: Option<String>) {
    let kind = entity.kind();
    let id = entity.id();
    let sync = entity.sync_mut();
    sync.mark_synced(external_id);
    sync.external_etag = etag;
    info!(%kind, id, external_id, "entity synced");
}

/// Record a failed sync attempt. Does not revert `is_synced`; the durable
/// outbox owns retrying.
pub fn mark_sync_failed(entity: &mut dyn Syncable, reason: &str) {
    let kind = entity.kind();
    let id = entity.id();
    entity.sync_mut().status = SyncStatus::SyncFailed;
    error!(%kind, id, reason, "sync failed");
}

/// True when the entity is linked and has local changes the mirror has
/// not seen. Used by batch reconciliation; the per-call path syncs on
/// every mutation regardless.
pub fn needs_sync(entity: &dyn Syncable) -> bool {
    let sync = entity.sync();
    if !sync.is_synced {
        return false;
    }
    match sync.last_synced_at {
        None => true,
        Some(last) => entity.updated_at() > last,
    }
}

/// Drop the external binding when a project disconnects its integration.
pub fn unlink(entity: &mut dyn Syncable) {
    let kind = entity.kind();
    let id = entity.id();
    entity.sync_mut().clear();
    info!(%kind, id, "entity unlinked");
}

/// Detect the `is_synced` without `external_id` invariant violation and
/// flag it for reconciliation. Never repairs automatically. Returns true
/// when the entity was flagged.
pub fn validate_sync_status(entity: &mut dyn Syncable) -> bool {
    let sync = entity.sync();
    if sync.is_synced && sync.external_id.is_none() {
        let kind = entity.kind();
        let id = entity.id();
        warn!(%kind, id, "sync state inconsistent: synced without external id");
        entity.sync_mut().status = SyncStatus::Conflict;
        return true;
    }
    false
}

/// Monitor sweep: run the validator across the whole store, persisting
/// and returning every entity it flags.
pub fn validate_all(db: &Database) -> Result<Vec<(EntityKind, i64)>> {
    let mut flagged = Vec::new();
    for mut issue in db.list_issues()? {
        if validate_sync_status(&mut issue) {
            db.save_sync_state(EntityKind::Issue, issue.id, &issue.sync)?;
            flagged.push((EntityKind::Issue, issue.id));
        }
    }
    for mut milestone in db.list_milestones()? {
        if validate_sync_status(&mut milestone) {
            db.save_sync_state(EntityKind::Milestone, milestone.id, &milestone.sync)?;
            flagged.push((EntityKind::Milestone, milestone.id));
        }
    }
    for mut comment in db.list_comments()? {
        if validate_sync_status(&mut comment) {
            db.save_sync_state(EntityKind::Comment, comment.id, &comment.sync)?;
            flagged.push((EntityKind::Comment, comment.id));
        }
    }
    Ok(flagged)
}

#[cfg(test)]
#[path = "state_tests.rs"]
mod tests;
