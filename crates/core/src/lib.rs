// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! tether-core: Shared library for the tether mirror sync
//!
//! This crate provides the domain models, per-entity sync state, SQLite
//! persistence, and the token cipher used by the tether sync crate and
//! the tetherd worker.

pub mod comment;
pub mod db;
pub mod error;
pub mod integration;
pub mod issue;
pub mod milestone;
pub mod outbox;
pub mod secret;
pub mod sync_state;

pub use comment::{Comment, IssueRef};
pub use db::Database;
pub use error::{Error, Result};
pub use integration::IntegrationRecord;
pub use issue::{Assignee, Issue, IssueStatus, MilestoneRef};
pub use milestone::Milestone;
pub use outbox::OutboxJob;
pub use secret::TokenCipher;
pub use sync_state::{EntityKind, SyncOperation, SyncState, SyncStatus, Syncable};
