// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! tether: internal-to-external mirror sync for project entities.
//!
//! Mirrors issues, milestones, and issue comments from the internal store
//! to an external tracker, one direction only. The internal store is
//! authoritative; the mirror is best-effort and must never fail the
//! domain operation that triggered it.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────┐ enqueue ┌─────────────┐ drain ┌─────────────┐
//! │ SyncManager  │────────►│   Outbox    │──────►│ SyncWorker  │
//! │ (dispatcher) │         │ (sqlite)    │       │ (tokio)     │
//! └──────────────┘         └─────────────┘       └──────┬──────┘
//!        │ eligibility                                  │ dispatch
//!        ▼                                              ▼
//! ┌──────────────┐                              ┌───────────────┐
//! │ Integration  │                              │   Handlers    │
//! │   lookup     │                              │ issue/ms/cmt  │
//! └──────────────┘                              └───────┬───────┘
//!                                                       ▼
//!                                               ┌───────────────┐
//!                                               │ TrackerClient │
//!                                               │ (trait, REST) │
//!                                               └───────────────┘
//! ```
//!
//! # Features
//!
//! - Durable outbox in the entity database, so a sync job is recorded in
//!   the same unit of work as the change it mirrors
//! - Background worker with bounded exponential backoff retries
//! - Typed not-found and etag-mismatch errors at the tracker boundary
//! - Idempotent external soft delete (close, title marker, audit comment)
//! - Injectable client factory for testing

pub mod config;
pub mod error;
pub mod extractor;
pub mod handlers;
pub mod manager;
pub mod outbox;
pub mod state;
pub mod tracker;
pub mod worker;

mod entity;

pub use config::SyncConfig;
pub use entity::SyncEntity;
pub use error::{SyncError, SyncResult};
pub use manager::SyncManager;
pub use outbox::{Outbox, RetryPolicy};
pub use worker::SyncWorker;

#[cfg(test)]
pub(crate) mod test_helpers;
