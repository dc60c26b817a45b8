use crate::error::FetchError;
use crate::github::types::{CommitRecord, IssueRecord, PullRequestRecord, RepositorySummary};
use serde::de::DeserializeOwned;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    Repository,
    Commits,
    Issues,
    PullRequests,
}

impl ResourceKind {
    pub fn is_list(self) -> bool {
        !matches!(self, ResourceKind::Repository)
    }

    pub fn url(self, api_base: &str, owner: &str, repo: &str, page_size: usize) -> String {
        let base = format!("{api_base}/repos/{owner}/{repo}");
        match self {
            ResourceKind::Repository => base,
            ResourceKind::Commits => format!("{base}/commits?per_page={page_size}"),
            ResourceKind::Issues => format!("{base}/issues?state=open&per_page={page_size}"),
            ResourceKind::PullRequests => format!("{base}/pulls?state=open&per_page={page_size}"),
        }
    }

    /// Noun used in user-facing failure messages.
    pub fn noun(self) -> &'static str {
        match self {
            ResourceKind::Repository => "repository data",
            ResourceKind::Commits => "commits",
            ResourceKind::Issues => "issues",
            ResourceKind::PullRequests => "pull requests",
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.noun())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    Repository(Box<RepositorySummary>),
    Commits(Vec<CommitRecord>),
    Issues(Vec<IssueRecord>),
    PullRequests(Vec<PullRequestRecord>),
}

impl Payload {
    pub fn len(&self) -> usize {
        match self {
            Payload::Repository(_) => 1,
            Payload::Commits(v) => v.len(),
            Payload::Issues(v) => v.len(),
            Payload::PullRequests(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Decodes a successful body and applies per-kind post-processing.
///
/// The issues endpoint also lists pull requests; those are dropped and the
/// remainder truncated to `page_size`, keeping the API's order.
pub fn decode_payload(kind: ResourceKind, body: &[u8], page_size: usize) -> Result<Payload, FetchError> {
    Ok(match kind {
        ResourceKind::Repository => Payload::Repository(Box::new(decode(body)?)),
        ResourceKind::Commits => Payload::Commits(decode(body)?),
        ResourceKind::Issues => Payload::Issues(issues_only(decode(body)?, page_size)),
        ResourceKind::PullRequests => Payload::PullRequests(decode(body)?),
    })
}

pub fn issues_only(records: Vec<IssueRecord>, page_size: usize) -> Vec<IssueRecord> {
    records
        .into_iter()
        .filter(|i| !i.is_pull_request())
        .take(page_size)
        .collect()
}

fn decode<T: DeserializeOwned>(body: &[u8]) -> Result<T, FetchError> {
    serde_json::from_slice(body).map_err(|e| FetchError::Decode(e.to_string()))
}
