// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use thiserror::Error;

use crate::tracker::TrackerError;

/// Errors raised inside the sync subsystem.
///
/// None of these ever reach the domain service that triggered the sync:
/// the manager swallows enqueue failures and the worker converts handler
/// failures into retries. The types exist so the catch boundaries can log
/// and branch on something better than strings.
#[derive(Debug, Error)]
pub enum SyncError {
    /// The guard in the manager should make this unreachable; seeing it
    /// means an integration was deactivated between enqueue and execution.
    #[error("no active integration for project {0}")]
    NoActiveIntegration(i64),

    #[error("tracker error: {0}")]
    Tracker(#[from] TrackerError),

    #[error("store error: {0}")]
    Store(#[from] tether_core::Error),

    #[error("payload error: {0}")]
    Payload(#[from] serde_json::Error),
}

/// A specialized Result type for sync operations.
pub type SyncResult<T> = Result<T, SyncError>;
