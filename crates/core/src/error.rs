// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use thiserror::Error;

/// All possible errors that can occur in the tether-core library.
#[derive(Debug, Error)]
pub enum Error {
    #[error("issue not found: {0}")]
    IssueNotFound(i64),

    #[error("milestone not found: {0}")]
    MilestoneNotFound(i64),

    #[error("comment not found: {0}")]
    CommentNotFound(i64),

    #[error("outbox job not found: {0}")]
    JobNotFound(i64),

    #[error("no active integration for project {0}")]
    NoActiveIntegration(i64),

    #[error("invalid issue status: '{0}'\n  hint: valid statuses are: todo, in_progress, completed")]
    InvalidIssueStatus(String),

    #[error("invalid sync status: '{0}'\n  hint: valid statuses are: not_synced, synced, sync_failed, conflict")]
    InvalidSyncStatus(String),

    #[error("invalid entity kind: '{0}'\n  hint: valid kinds are: issue, milestone, comment")]
    InvalidEntityKind(String),

    #[error("invalid sync operation: '{0}'\n  hint: valid operations are: create, update, delete")]
    InvalidSyncOperation(String),

    #[error("invalid repository '{0}'\n  hint: expected the \"owner/name\" form")]
    InvalidRepository(String),

    #[error("crypto error: {0}")]
    Crypto(String),

    #[error("config error: {0}")]
    Config(String),

    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("corrupted data in database: {0}")]
    CorruptedData(String),
}

/// A specialized Result type for tether-core operations.
pub type Result<T> = std::result::Result<T, Error>;
