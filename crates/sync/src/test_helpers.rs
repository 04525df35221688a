// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Shared fixtures: entity constructors, an in-memory tracker double,
//! and a factory that hands it out.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use chrono::Utc;

use tether_core::{
    Comment, Database, IntegrationRecord, Issue, IssueRef, IssueStatus, Milestone, SyncState,
};

use crate::tracker::{
    ClientFactory, IssueState, IssueUpdate, NewIssue, Repository, TrackerClient, TrackerComment,
    TrackerError, TrackerFuture, TrackerIssue, TrackerMilestone, TrackerResult,
};

pub fn issue(project_id: i64, title: &str) -> Issue {
    let now = Utc::now();
    Issue {
        id: 0,
        project_id,
        title: title.to_string(),
        body: None,
        status: IssueStatus::Todo,
        assignee: None,
        milestone: None,
        created_at: now,
        updated_at: now,
        sync: SyncState::default(),
    }
}

pub fn milestone(project_id: i64, name: &str) -> Milestone {
    let now = Utc::now();
    Milestone {
        id: 0,
        project_id,
        name: name.to_string(),
        description: None,
        due_on: None,
        completed: false,
        created_at: now,
        updated_at: now,
        sync: SyncState::default(),
    }
}

pub fn comment(body: &str, issue: Option<IssueRef>) -> Comment {
    let now = Utc::now();
    Comment {
        id: 0,
        author_member_id: 1,
        body: body.to_string(),
        issue,
        created_at: now,
        updated_at: now,
        sync: SyncState::default(),
    }
}

/// Create an active integration for a project. The token is opaque to
/// the mock factory, so any string works.
pub fn link_project(db: &Database, project_id: i64) -> IntegrationRecord {
    let mut record = IntegrationRecord {
        id: 0,
        project_id,
        member_id: Some(1),
        repository: "acme/widgets".to_string(),
        token: "sealed-token".to_string(),
        active: true,
        created_at: Utc::now(),
    };
    db.create_integration(&mut record).expect("integration");
    record
}

#[derive(Default)]
struct MockState {
    next_issue: i64,
    next_comment: i64,
    next_milestone: i64,
    etag_seq: u64,
    issues: BTreeMap<i64, TrackerIssue>,
    comments: BTreeMap<i64, Vec<TrackerComment>>,
    milestones: BTreeMap<i64, TrackerMilestone>,
    fail_transport: bool,
    calls: Vec<String>,
}

/// In-memory [`TrackerClient`] double. Mutating calls are recorded so
/// tests can assert idempotency; `fail_transport` makes every call fail
/// so retry paths can be exercised.
#[derive(Default)]
pub struct MockTracker {
    inner: Mutex<MockState>,
}

impl MockTracker {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn seed_issue(&self, issue: TrackerIssue) {
        let mut state = self.inner.lock().unwrap();
        state.next_issue = state.next_issue.max(issue.number);
        state.issues.insert(issue.number, issue);
    }

    pub fn seed_comment(&self, issue_number: i64, comment: TrackerComment) {
        let mut state = self.inner.lock().unwrap();
        state.next_comment = state.next_comment.max(comment.id);
        state.comments.entry(issue_number).or_default().push(comment);
    }

    pub fn remove_issue(&self, number: i64) {
        self.inner.lock().unwrap().issues.remove(&number);
    }

    /// Drop a comment out of band, as an external user deleting it would.
    pub fn remove_comment(&self, comment_id: i64) {
        let mut state = self.inner.lock().unwrap();
        for comments in state.comments.values_mut() {
            comments.retain(|c| c.id != comment_id);
        }
    }

    /// Bump an issue's etag without going through the client, as a
    /// concurrent external edit would.
    pub fn touch_issue(&self, number: i64) {
        let mut state = self.inner.lock().unwrap();
        state.etag_seq += 1;
        let etag = Some(format!("W/\"{}\"", state.etag_seq));
        if let Some(issue) = state.issues.get_mut(&number) {
            issue.etag = etag;
        }
    }

    pub fn set_fail_transport(&self, fail: bool) {
        self.inner.lock().unwrap().fail_transport = fail;
    }

    pub fn issue(&self, number: i64) -> Option<TrackerIssue> {
        self.inner.lock().unwrap().issues.get(&number).cloned()
    }

    pub fn comments(&self, issue_number: i64) -> Vec<TrackerComment> {
        self.inner
            .lock()
            .unwrap()
            .comments
            .get(&issue_number)
            .cloned()
            .unwrap_or_default()
    }

    pub fn milestone(&self, number: i64) -> Option<TrackerMilestone> {
        self.inner.lock().unwrap().milestones.get(&number).cloned()
    }

    /// Names of the mutating calls made so far, in order.
    pub fn calls(&self) -> Vec<String> {
        self.inner.lock().unwrap().calls.clone()
    }

    fn guard(state: &MockState) -> TrackerResult<()> {
        if state.fail_transport {
            return Err(TrackerError::Transport("mock offline".to_string()));
        }
        Ok(())
    }
}

impl TrackerClient for Arc<MockTracker> {
    fn get_repository(&self) -> TrackerFuture<'_, Repository> {
        let state = self.inner.lock().unwrap();
        let result = MockTracker::guard(&state).map(|_| Repository {
            full_name: "acme/widgets".to_string(),
            has_issues: true,
        });
        Box::pin(async move { result })
    }

    fn create_issue(&self, new: NewIssue) -> TrackerFuture<'_, TrackerIssue> {
        let mut state = self.inner.lock().unwrap();
        let result = MockTracker::guard(&state).map(|_| {
            state.calls.push("create_issue".to_string());
            state.next_issue += 1;
            state.etag_seq += 1;
            let issue = TrackerIssue {
                number: state.next_issue,
                title: new.title,
                body: new.body,
                state: IssueState::Open,
                assignees: new.assignee.into_iter().collect(),
                milestone: new.milestone,
                etag: Some(format!("W/\"{}\"", state.etag_seq)),
            };
            state.issues.insert(issue.number, issue.clone());
            issue
        });
        Box::pin(async move { result })
    }

    fn get_issue(&self, number: i64) -> TrackerFuture<'_, TrackerIssue> {
        let state = self.inner.lock().unwrap();
        let result = MockTracker::guard(&state).and_then(|_| {
            state.issues.get(&number).cloned().ok_or(TrackerError::NotFound)
        });
        Box::pin(async move { result })
    }

    fn update_issue(
        &self,
        number: i64,
        update: IssueUpdate,
        if_match: Option<String>,
    ) -> TrackerFuture<'_, TrackerIssue> {
        let mut state = self.inner.lock().unwrap();
        let result = MockTracker::guard(&state).and_then(|_| {
            state.calls.push("update_issue".to_string());
            state.etag_seq += 1;
            let etag = Some(format!("W/\"{}\"", state.etag_seq));
            let issue = state
                .issues
                .get_mut(&number)
                .ok_or(TrackerError::NotFound)?;
            if let Some(expected) = if_match {
                if issue.etag.as_deref() != Some(expected.as_str()) {
                    return Err(TrackerError::PreconditionFailed);
                }
            }
            if let Some(title) = update.title {
                issue.title = title;
            }
            if let Some(body) = update.body {
                issue.body = Some(body);
            }
            if let Some(new_state) = update.state {
                issue.state = new_state;
            }
            if let Some(assignees) = update.assignees {
                issue.assignees = assignees;
            }
            if let Some(milestone) = update.milestone {
                issue.milestone = milestone;
            }
            issue.etag = etag;
            Ok(issue.clone())
        });
        Box::pin(async move { result })
    }

    fn create_milestone(&self, title: String) -> TrackerFuture<'_, TrackerMilestone> {
        let mut state = self.inner.lock().unwrap();
        let result = MockTracker::guard(&state).map(|_| {
            state.calls.push("create_milestone".to_string());
            state.next_milestone += 1;
            let milestone = TrackerMilestone {
                number: state.next_milestone,
                title,
            };
            state.milestones.insert(milestone.number, milestone.clone());
            milestone
        });
        Box::pin(async move { result })
    }

    fn get_milestone(&self, number: i64) -> TrackerFuture<'_, TrackerMilestone> {
        let state = self.inner.lock().unwrap();
        let result = MockTracker::guard(&state).and_then(|_| {
            state
                .milestones
                .get(&number)
                .cloned()
                .ok_or(TrackerError::NotFound)
        });
        Box::pin(async move { result })
    }

    fn delete_milestone(&self, number: i64) -> TrackerFuture<'_, ()> {
        let mut state = self.inner.lock().unwrap();
        let result = MockTracker::guard(&state).and_then(|_| {
            state.calls.push("delete_milestone".to_string());
            state
                .milestones
                .remove(&number)
                .map(|_| ())
                .ok_or(TrackerError::NotFound)
        });
        Box::pin(async move { result })
    }

    fn create_comment(&self, issue_number: i64, body: String) -> TrackerFuture<'_, TrackerComment> {
        let mut state = self.inner.lock().unwrap();
        let result = MockTracker::guard(&state).and_then(|_| {
            state.calls.push("create_comment".to_string());
            if !state.issues.contains_key(&issue_number) {
                return Err(TrackerError::NotFound);
            }
            state.next_comment += 1;
            let comment = TrackerComment {
                id: state.next_comment,
                body,
            };
            state
                .comments
                .entry(issue_number)
                .or_default()
                .push(comment.clone());
            Ok(comment)
        });
        Box::pin(async move { result })
    }

    fn list_comments(&self, issue_number: i64) -> TrackerFuture<'_, Vec<TrackerComment>> {
        let state = self.inner.lock().unwrap();
        let result = MockTracker::guard(&state)
            .map(|_| state.comments.get(&issue_number).cloned().unwrap_or_default());
        Box::pin(async move { result })
    }

    fn update_comment(&self, comment_id: i64, body: String) -> TrackerFuture<'_, TrackerComment> {
        let mut state = self.inner.lock().unwrap();
        let result = MockTracker::guard(&state).and_then(|_| {
            state.calls.push("update_comment".to_string());
            for comments in state.comments.values_mut() {
                if let Some(comment) = comments.iter_mut().find(|c| c.id == comment_id) {
                    comment.body = body;
                    return Ok(comment.clone());
                }
            }
            Err(TrackerError::NotFound)
        });
        Box::pin(async move { result })
    }

    fn delete_comment(&self, comment_id: i64) -> TrackerFuture<'_, ()> {
        let mut state = self.inner.lock().unwrap();
        let result = MockTracker::guard(&state).and_then(|_| {
            state.calls.push("delete_comment".to_string());
            for comments in state.comments.values_mut() {
                if let Some(pos) = comments.iter().position(|c| c.id == comment_id) {
                    comments.remove(pos);
                    return Ok(());
                }
            }
            Err(TrackerError::NotFound)
        });
        Box::pin(async move { result })
    }
}

/// [`ClientFactory`] returning clones of one shared [`MockTracker`].
pub struct MockFactory {
    pub tracker: Arc<MockTracker>,
}

impl MockFactory {
    pub fn new(tracker: Arc<MockTracker>) -> Self {
        Self { tracker }
    }
}

impl ClientFactory for MockFactory {
    fn client(&self, _integration: &IntegrationRecord) -> TrackerResult<Box<dyn TrackerClient>> {
        Ok(Box::new(self.tracker.clone()))
    }
}
