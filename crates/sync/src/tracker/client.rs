// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! The tracker client trait and its typed error set.

use std::future::Future;
use std::pin::Pin;

use tether_core::IntegrationRecord;

use super::types::{
    IssueUpdate, NewIssue, Repository, TrackerComment, TrackerIssue, TrackerMilestone,
};

/// Error type for tracker operations.
///
/// `NotFound` and `PreconditionFailed` are part of the protocol the
/// handlers branch on; everything else is a transport-level failure the
/// worker retries.
#[derive(Debug, thiserror::Error)]
pub enum TrackerError {
    /// The external object does not exist (HTTP 404).
    #[error("not found")]
    NotFound,

    /// Conditional update rejected: the stored etag no longer matches
    /// (HTTP 412).
    #[error("precondition failed: etag mismatch")]
    PreconditionFailed,

    /// Credential rejected or insufficient (HTTP 401/403).
    #[error("authentication failed: {0}")]
    Auth(String),

    /// Request quota exhausted.
    #[error("rate limited")]
    RateLimited,

    /// Any other unexpected status.
    #[error("http error ({status}): {message}")]
    Http { status: u16, message: String },

    /// Connection-level failure (DNS, TLS, timeout).
    #[error("transport error: {0}")]
    Transport(String),

    /// The client could not be built (malformed repository binding,
    /// bad HTTP configuration).
    #[error("client config error: {0}")]
    Config(String),

    /// Response body did not match the expected shape.
    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Result type for tracker operations.
pub type TrackerResult<T> = Result<T, TrackerError>;

/// Boxed future returned by trait methods, so the client stays
/// object-safe and mockable.
pub type TrackerFuture<'a, T> = Pin<Box<dyn Future<Output = TrackerResult<T>> + Send + 'a>>;

/// The external tracker's API surface, scoped to one repository.
///
/// Implementations carry the repository binding and credential; callers
/// obtain one per operation through a [`ClientFactory`].
pub trait TrackerClient: Send + Sync {
    fn get_repository(&self) -> TrackerFuture<'_, Repository>;

    fn create_issue(&self, new: NewIssue) -> TrackerFuture<'_, TrackerIssue>;

    fn get_issue(&self, number: i64) -> TrackerFuture<'_, TrackerIssue>;

    /// Apply a field diff. When `if_match` carries an etag the update is
    /// conditional and fails with [`TrackerError::PreconditionFailed`] if
    /// the external object changed since that etag was captured.
    fn update_issue(
        &self,
        number: i64,
        update: IssueUpdate,
        if_match: Option<String>,
    ) -> TrackerFuture<'_, TrackerIssue>;

    fn create_milestone(&self, title: String) -> TrackerFuture<'_, TrackerMilestone>;

    fn get_milestone(&self, number: i64) -> TrackerFuture<'_, TrackerMilestone>;

    fn delete_milestone(&self, number: i64) -> TrackerFuture<'_, ()>;

    fn create_comment(&self, issue_number: i64, body: String) -> TrackerFuture<'_, TrackerComment>;

    /// All comments on an issue. There is no fetch-by-id for comments;
    /// callers scan this list.
    fn list_comments(&self, issue_number: i64) -> TrackerFuture<'_, Vec<TrackerComment>>;

    fn update_comment(&self, comment_id: i64, body: String) -> TrackerFuture<'_, TrackerComment>;

    fn delete_comment(&self, comment_id: i64) -> TrackerFuture<'_, ()>;
}

/// Builds a [`TrackerClient`] for an integration, decrypting its stored
/// credential at call time. The seam tests inject mocks through.
pub trait ClientFactory: Send + Sync {
    fn client(&self, integration: &IntegrationRecord) -> TrackerResult<Box<dyn TrackerClient>>;
}
