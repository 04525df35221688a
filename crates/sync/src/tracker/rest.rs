// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! REST implementation of the tracker client.
//!
//! Speaks the GitHub v3 JSON protocol against a configurable API base so
//! tests and self-hosted deployments can point it elsewhere. Captures
//! response ETags for conditional updates and maps HTTP statuses onto the
//! typed [`TrackerError`] set.

use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, ETAG, IF_MATCH, USER_AGENT};
use reqwest::StatusCode;
use serde::Deserialize;

use tether_core::{IntegrationRecord, TokenCipher};

use super::client::{ClientFactory, TrackerClient, TrackerError, TrackerFuture, TrackerResult};
use super::types::{
    IssueState, IssueUpdate, NewIssue, Repository, TrackerComment, TrackerIssue, TrackerMilestone,
};

const MEDIA_TYPE: &str = "application/vnd.github+json";
const AGENT: &str = concat!("tetherd/", env!("CARGO_PKG_VERSION"));
const PAGE_SIZE: usize = 100;

// ----- wire shapes -----

#[derive(Deserialize)]
struct RawUser {
    login: String,
}

#[derive(Deserialize)]
struct RawMilestone {
    number: i64,
    title: String,
}

#[derive(Deserialize)]
struct RawIssue {
    number: i64,
    title: String,
    body: Option<String>,
    state: IssueState,
    #[serde(default)]
    assignees: Vec<RawUser>,
    milestone: Option<RawMilestone>,
}

#[derive(Deserialize)]
struct RawComment {
    id: i64,
    body: String,
}

#[derive(Deserialize)]
struct RawRepository {
    full_name: String,
    #[serde(default)]
    has_issues: bool,
}

impl RawIssue {
    fn into_issue(self, etag: Option<String>) -> TrackerIssue {
        TrackerIssue {
            number: self.number,
            title: self.title,
            body: self.body,
            state: self.state,
            assignees: self.assignees.into_iter().map(|u| u.login).collect(),
            milestone: self.milestone.map(|m| m.number),
            etag,
        }
    }
}

// ----- client -----

/// Tracker client over HTTP, scoped to one repository.
pub struct RestTrackerClient {
    http: reqwest::Client,
    base: String,
    repository: String,
    token: String,
}

impl RestTrackerClient {
    /// Build a client for `repository` (`owner/name`) against `base`
    /// (e.g. `https://api.github.com`) with a plaintext token.
    pub fn new(
        base: &str,
        repository: &str,
        token: String,
        timeout: Duration,
    ) -> TrackerResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| TrackerError::Config(e.to_string()))?;

        Ok(RestTrackerClient {
            http,
            base: base.trim_end_matches('/').to_string(),
            repository: repository.to_string(),
            token,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/repos/{}/{}", self.base, self.repository, path)
    }

    fn headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static(MEDIA_TYPE));
        headers.insert(USER_AGENT, HeaderValue::from_static(AGENT));
        if let Ok(auth) = HeaderValue::from_str(&format!("Bearer {}", self.token)) {
            headers.insert(AUTHORIZATION, auth);
        }
        headers
    }

    async fn check(resp: reqwest::Response) -> TrackerResult<reqwest::Response> {
        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }
        match status {
            StatusCode::NOT_FOUND => Err(TrackerError::NotFound),
            StatusCode::PRECONDITION_FAILED => Err(TrackerError::PreconditionFailed),
            StatusCode::UNAUTHORIZED => Err(TrackerError::Auth("credential rejected".to_string())),
            StatusCode::FORBIDDEN | StatusCode::TOO_MANY_REQUESTS => {
                let exhausted = resp
                    .headers()
                    .get("x-ratelimit-remaining")
                    .and_then(|v| v.to_str().ok())
                    .map(|v| v == "0")
                    .unwrap_or(status == StatusCode::TOO_MANY_REQUESTS);
                if exhausted {
                    Err(TrackerError::RateLimited)
                } else {
                    Err(TrackerError::Auth("access forbidden".to_string()))
                }
            }
            _ => {
                let body = resp.text().await.unwrap_or_default();
                let message: String = body.chars().take(200).collect();
                Err(TrackerError::Http {
                    status: status.as_u16(),
                    message,
                })
            }
        }
    }

    fn etag_of(resp: &reqwest::Response) -> Option<String> {
        resp.headers()
            .get(ETAG)
            .and_then(|v| v.to_str().ok())
            .map(String::from)
    }

    async fn decode<T: serde::de::DeserializeOwned>(resp: reqwest::Response) -> TrackerResult<T> {
        resp.json::<T>()
            .await
            .map_err(|e| TrackerError::Serialization(e.to_string()))
    }

    async fn do_get_repository(&self) -> TrackerResult<Repository> {
        let url = format!("{}/repos/{}", self.base, self.repository);
        let resp = self
            .http
            .get(url)
            .headers(self.headers())
            .send()
            .await
            .map_err(|e| TrackerError::Transport(e.to_string()))?;
        let raw: RawRepository = Self::decode(Self::check(resp).await?).await?;
        Ok(Repository {
            full_name: raw.full_name,
            has_issues: raw.has_issues,
        })
    }

    async fn do_create_issue(&self, new: NewIssue) -> TrackerResult<TrackerIssue> {
        let resp = self
            .http
            .post(self.url("issues"))
            .headers(self.headers())
            .json(&new)
            .send()
            .await
            .map_err(|e| TrackerError::Transport(e.to_string()))?;
        let resp = Self::check(resp).await?;
        let etag = Self::etag_of(&resp);
        let raw: RawIssue = Self::decode(resp).await?;
        Ok(raw.into_issue(etag))
    }

    async fn do_get_issue(&self, number: i64) -> TrackerResult<TrackerIssue> {
        let resp = self
            .http
            .get(self.url(&format!("issues/{number}")))
            .headers(self.headers())
            .send()
            .await
            .map_err(|e| TrackerError::Transport(e.to_string()))?;
        let resp = Self::check(resp).await?;
        let etag = Self::etag_of(&resp);
        let raw: RawIssue = Self::decode(resp).await?;
        Ok(raw.into_issue(etag))
    }

    async fn do_update_issue(
        &self,
        number: i64,
        update: IssueUpdate,
        if_match: Option<String>,
    ) -> TrackerResult<TrackerIssue> {
        let mut headers = self.headers();
        if let Some(etag) = if_match {
            if let Ok(value) = HeaderValue::from_str(&etag) {
                headers.insert(IF_MATCH, value);
            }
        }
        let resp = self
            .http
            .patch(self.url(&format!("issues/{number}")))
            .headers(headers)
            .json(&update)
            .send()
            .await
            .map_err(|e| TrackerError::Transport(e.to_string()))?;
        let resp = Self::check(resp).await?;
        let etag = Self::etag_of(&resp);
        let raw: RawIssue = Self::decode(resp).await?;
        Ok(raw.into_issue(etag))
    }

    async fn do_create_milestone(&self, title: String) -> TrackerResult<TrackerMilestone> {
        let resp = self
            .http
            .post(self.url("milestones"))
            .headers(self.headers())
            .json(&serde_json::json!({ "title": title }))
            .send()
            .await
            .map_err(|e| TrackerError::Transport(e.to_string()))?;
        let raw: RawMilestone = Self::decode(Self::check(resp).await?).await?;
        Ok(TrackerMilestone {
            number: raw.number,
            title: raw.title,
        })
    }

    async fn do_get_milestone(&self, number: i64) -> TrackerResult<TrackerMilestone> {
        let resp = self
            .http
            .get(self.url(&format!("milestones/{number}")))
            .headers(self.headers())
            .send()
            .await
            .map_err(|e| TrackerError::Transport(e.to_string()))?;
        let raw: RawMilestone = Self::decode(Self::check(resp).await?).await?;
        Ok(TrackerMilestone {
            number: raw.number,
            title: raw.title,
        })
    }

    async fn do_delete_milestone(&self, number: i64) -> TrackerResult<()> {
        let resp = self
            .http
            .delete(self.url(&format!("milestones/{number}")))
            .headers(self.headers())
            .send()
            .await
            .map_err(|e| TrackerError::Transport(e.to_string()))?;
        Self::check(resp).await?;
        Ok(())
    }

    async fn do_create_comment(
        &self,
        issue_number: i64,
        body: String,
    ) -> TrackerResult<TrackerComment> {
        let resp = self
            .http
            .post(self.url(&format!("issues/{issue_number}/comments")))
            .headers(self.headers())
            .json(&serde_json::json!({ "body": body }))
            .send()
            .await
            .map_err(|e| TrackerError::Transport(e.to_string()))?;
        let raw: RawComment = Self::decode(Self::check(resp).await?).await?;
        Ok(TrackerComment {
            id: raw.id,
            body: raw.body,
        })
    }

    async fn do_list_comments(&self, issue_number: i64) -> TrackerResult<Vec<TrackerComment>> {
        // Pages through the full list; the protocol has no comment
        // fetch-by-id, so callers scan the result.
        let mut all = Vec::new();
        let mut page = 1usize;
        loop {
            let url = format!(
                "{}?per_page={PAGE_SIZE}&page={page}",
                self.url(&format!("issues/{issue_number}/comments"))
            );
            let resp = self
                .http
                .get(url)
                .headers(self.headers())
                .send()
                .await
                .map_err(|e| TrackerError::Transport(e.to_string()))?;
            let raw: Vec<RawComment> = Self::decode(Self::check(resp).await?).await?;
            let len = raw.len();
            all.extend(raw.into_iter().map(|c| TrackerComment {
                id: c.id,
                body: c.body,
            }));
            if len < PAGE_SIZE {
                return Ok(all);
            }
            page += 1;
        }
    }

    async fn do_update_comment(
        &self,
        comment_id: i64,
        body: String,
    ) -> TrackerResult<TrackerComment> {
        let resp = self
            .http
            .patch(self.url(&format!("issues/comments/{comment_id}")))
            .headers(self.headers())
            .json(&serde_json::json!({ "body": body }))
            .send()
            .await
            .map_err(|e| TrackerError::Transport(e.to_string()))?;
        let raw: RawComment = Self::decode(Self::check(resp).await?).await?;
        Ok(TrackerComment {
            id: raw.id,
            body: raw.body,
        })
    }

    async fn do_delete_comment(&self, comment_id: i64) -> TrackerResult<()> {
        let resp = self
            .http
            .delete(self.url(&format!("issues/comments/{comment_id}")))
            .headers(self.headers())
            .send()
            .await
            .map_err(|e| TrackerError::Transport(e.to_string()))?;
        Self::check(resp).await?;
        Ok(())
    }
}

impl TrackerClient for RestTrackerClient {
    fn get_repository(&self) -> TrackerFuture<'_, Repository> {
        Box::pin(self.do_get_repository())
    }

    fn create_issue(&self, new: NewIssue) -> TrackerFuture<'_, TrackerIssue> {
        Box::pin(self.do_create_issue(new))
    }

    fn get_issue(&self, number: i64) -> TrackerFuture<'_, TrackerIssue> {
        Box::pin(self.do_get_issue(number))
    }

    fn update_issue(
        &self,
        number: i64,
        update: IssueUpdate,
        if_match: Option<String>,
    ) -> TrackerFuture<'_, TrackerIssue> {
        Box::pin(self.do_update_issue(number, update, if_match))
    }

    fn create_milestone(&self, title: String) -> TrackerFuture<'_, TrackerMilestone> {
        Box::pin(self.do_create_milestone(title))
    }

    fn get_milestone(&self, number: i64) -> TrackerFuture<'_, TrackerMilestone> {
        Box::pin(self.do_get_milestone(number))
    }

    fn delete_milestone(&self, number: i64) -> TrackerFuture<'_, ()> {
        Box::pin(self.do_delete_milestone(number))
    }

    fn create_comment(&self, issue_number: i64, body: String) -> TrackerFuture<'_, TrackerComment> {
        Box::pin(self.do_create_comment(issue_number, body))
    }

    fn list_comments(&self, issue_number: i64) -> TrackerFuture<'_, Vec<TrackerComment>> {
        Box::pin(self.do_list_comments(issue_number))
    }

    fn update_comment(&self, comment_id: i64, body: String) -> TrackerFuture<'_, TrackerComment> {
        Box::pin(self.do_update_comment(comment_id, body))
    }

    fn delete_comment(&self, comment_id: i64) -> TrackerFuture<'_, ()> {
        Box::pin(self.do_delete_comment(comment_id))
    }
}

/// Production client factory: decrypts the integration's stored token and
/// builds a [`RestTrackerClient`] for its repository.
pub struct RestFactory {
    base: String,
    cipher: TokenCipher,
    timeout: Duration,
}

impl RestFactory {
    pub fn new(base: String, cipher: TokenCipher, timeout: Duration) -> Self {
        RestFactory {
            base,
            cipher,
            timeout,
        }
    }
}

impl ClientFactory for RestFactory {
    fn client(&self, integration: &IntegrationRecord) -> TrackerResult<Box<dyn TrackerClient>> {
        // Reject malformed bindings before any request is made.
        integration
            .repo_parts()
            .map_err(|e| TrackerError::Config(e.to_string()))?;

        let token = self
            .cipher
            .decrypt(&integration.token)
            .map_err(|e| TrackerError::Auth(format!("token decrypt failed: {e}")))?;

        let client =
            RestTrackerClient::new(&self.base, &integration.repository, token, self.timeout)?;
        Ok(Box::new(client))
    }
}

#[cfg(test)]
#[path = "rest_tests.rs"]
mod tests;
