// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Per-entity sync state for the external tracker mirror.
//!
//! Every syncable entity (issue, milestone, issue comment) carries a
//! [`SyncState`] recording its external identifier, the time of the last
//! successful round trip, and a [`SyncStatus`]. The [`Syncable`] trait is
//! the capability seam the sync layer operates through - entities compose
//! the state rather than inheriting from a base type.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};

/// Sync status of an entity with respect to the external tracker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncStatus {
    /// Never successfully mirrored. Initial state.
    NotSynced,
    /// A create/update round trip with the tracker has succeeded.
    Synced,
    /// The most recent sync attempt failed; the mirror may be stale.
    SyncFailed,
    /// The persisted state is internally inconsistent (or the external
    /// copy diverged) and needs reconciliation.
    Conflict,
}

impl SyncStatus {
    /// Returns the string representation used in storage and display.
    pub fn as_str(&self) -> &'static str {
        match self {
            SyncStatus::NotSynced => "not_synced",
            SyncStatus::Synced => "synced",
            SyncStatus::SyncFailed => "sync_failed",
            SyncStatus::Conflict => "conflict",
        }
    }
}

impl fmt::Display for SyncStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for SyncStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "not_synced" => Ok(SyncStatus::NotSynced),
            "synced" => Ok(SyncStatus::Synced),
            "sync_failed" => Ok(SyncStatus::SyncFailed),
            "conflict" => Ok(SyncStatus::Conflict),
            _ => Err(Error::InvalidSyncStatus(s.to_string())),
        }
    }
}

/// The closed set of entity kinds the sync layer knows how to mirror.
///
/// Dispatch over kinds is an exhaustive `match` everywhere, so adding a
/// kind is a compile-time checklist rather than a runtime registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Issue,
    Milestone,
    Comment,
}

impl EntityKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::Issue => "issue",
            EntityKind::Milestone => "milestone",
            EntityKind::Comment => "comment",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for EntityKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "issue" => Ok(EntityKind::Issue),
            "milestone" => Ok(EntityKind::Milestone),
            "comment" => Ok(EntityKind::Comment),
            _ => Err(Error::InvalidEntityKind(s.to_string())),
        }
    }
}

/// The mutating operation a domain service performed on an entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncOperation {
    Create,
    Update,
    Delete,
}

impl SyncOperation {
    pub fn as_str(&self) -> &'static str {
        match self {
            SyncOperation::Create => "create",
            SyncOperation::Update => "update",
            SyncOperation::Delete => "delete",
        }
    }
}

impl fmt::Display for SyncOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for SyncOperation {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "create" => Ok(SyncOperation::Create),
            "update" => Ok(SyncOperation::Update),
            "delete" => Ok(SyncOperation::Delete),
            _ => Err(Error::InvalidSyncOperation(s.to_string())),
        }
    }
}

/// Mirror state carried by every syncable entity.
///
/// Invariant: `is_synced` implies `external_id` is present under normal
/// operation. The validator in the sync crate flags violations as
/// [`SyncStatus::Conflict`] rather than repairing them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyncState {
    /// The external tracker's identifier (issue/milestone number, comment id).
    pub external_id: Option<i64>,
    /// True once a successful create round trip has occurred.
    pub is_synced: bool,
    /// Set on every successful sync.
    pub last_synced_at: Option<DateTime<Utc>>,
    /// ETag from the tracker's last response, for conditional updates.
    pub external_etag: Option<String>,
    /// Current status of the mirror.
    pub status: SyncStatus,
}

impl Default for SyncState {
    fn default() -> Self {
        SyncState {
            external_id: None,
            is_synced: false,
            last_synced_at: None,
            external_etag: None,
            status: SyncStatus::NotSynced,
        }
    }
}

impl SyncState {
    /// Record a successful create round trip with the tracker.
    pub fn mark_synced(&mut self, external_id: i64) {
        self.external_id = Some(external_id);
        self.is_synced = true;
        self.last_synced_at = Some(Utc::now());
        self.status = SyncStatus::Synced;
    }

    /// Record a successful update round trip. Also recovers the status
    /// when a retried job succeeds after earlier failures.
    pub fn touch(&mut self) {
        self.last_synced_at = Some(Utc::now());
        self.status = SyncStatus::Synced;
    }

    /// Drop the external binding entirely (project disconnected its
    /// integration). Leaves the entity as if it had never been synced.
    pub fn clear(&mut self) {
        self.external_id = None;
        self.is_synced = false;
        self.last_synced_at = None;
        self.external_etag = None;
        self.status = SyncStatus::NotSynced;
    }
}

/// Capability implemented by every entity the sync layer can mirror.
pub trait Syncable {
    /// Internal primary key, assigned at persistence time.
    fn id(&self) -> i64;

    /// Which kind of entity this is.
    fn kind(&self) -> EntityKind;

    /// Last modification time, maintained by the owning entity.
    fn updated_at(&self) -> DateTime<Utc>;

    fn sync(&self) -> &SyncState;

    fn sync_mut(&mut self) -> &mut SyncState;
}

#[cfg(test)]
#[path = "sync_state_tests.rs"]
mod tests;
