// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! External tracker boundary.
//!
//! [`TrackerClient`] is the full API surface the sync layer consumes:
//! issues, milestones, issue comments, and the repository itself. Errors
//! are typed - a missing external object is [`TrackerError::NotFound`],
//! never a substring match on a message. [`RestTrackerClient`] is the
//! production implementation; tests inject mocks at the trait.
//!
//! One quirk of the wire protocol matters to callers: comments cannot be
//! fetched by id, only listed per issue, so locating a comment is a
//! linear scan.

mod client;
mod rest;
mod types;

pub use client::{ClientFactory, TrackerClient, TrackerError, TrackerFuture, TrackerResult};
pub use rest::{RestFactory, RestTrackerClient};
pub use types::{
    IssueState, IssueUpdate, NewIssue, Repository, TrackerComment, TrackerIssue, TrackerMilestone,
};
