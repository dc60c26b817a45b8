#![cfg(test)]

use crate::error::FetchError;
use crate::github::client::{Fetcher, RawResponse};
use crate::token::Credential;
use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::StatusCode;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub fn issue_json(number: u64, is_pr: bool) -> serde_json::Value {
    let mut v = serde_json::json!({
        "id": number * 100,
        "number": number,
        "title": format!("item {number}"),
        "html_url": format!("https://github.com/o/r/issues/{number}"),
        "state": "open",
        "created_at": "2024-01-01T00:00:00Z",
        "comments": 0,
        "user": {"login": "octocat"},
        "labels": []
    });
    if is_pr {
        v["pull_request"] = serde_json::json!({"url": "https://api.github.com/repos/o/r/pulls/1"});
    }
    v
}

pub fn mixed_issue_body(items: &[(u64, bool)]) -> Vec<u8> {
    let arr: Vec<_> = items.iter().map(|(n, pr)| issue_json(*n, *pr)).collect();
    serde_json::to_vec(&arr).unwrap()
}

pub fn commits_body(count: usize) -> Vec<u8> {
    let arr: Vec<_> = (0..count)
        .map(|i| {
            serde_json::json!({
                "sha": format!("{i:040x}"),
                "html_url": "",
                "commit": {"message": format!("commit {i}"), "author": {"name": "dev", "date": "2024-01-01T00:00:00Z"}},
                "author": null
            })
        })
        .collect();
    serde_json::to_vec(&arr).unwrap()
}

pub fn repo_body(name: &str) -> Vec<u8> {
    serde_json::to_vec(&serde_json::json!({
        "name": name,
        "full_name": format!("o/{name}"),
        "stargazers_count": 12,
        "forks_count": 3,
        "watchers_count": 12,
        "open_issues_count": 2
    }))
    .unwrap()
}

pub fn ok_response(body: Vec<u8>) -> RawResponse {
    let mut headers = HeaderMap::new();
    headers.insert("x-ratelimit-remaining", HeaderValue::from_static("57"));
    headers.insert("x-ratelimit-limit", HeaderValue::from_static("60"));
    RawResponse {
        status: StatusCode::OK,
        status_text: "OK".to_string(),
        headers,
        body,
    }
}

pub fn status_response(code: u16, text: &str) -> RawResponse {
    RawResponse {
        status: StatusCode::from_u16(code).unwrap(),
        status_text: text.to_string(),
        headers: HeaderMap::new(),
        body: Vec::new(),
    }
}

#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub url: String,
    pub credential: Option<String>,
    pub at: tokio::time::Instant,
}

/// Scripted fetcher. Pops queued responses in order; repeats the fallback
/// once the queue is drained.
#[derive(Clone)]
pub struct FakeFetcher {
    queue: Arc<Mutex<VecDeque<Result<RawResponse, FetchError>>>>,
    fallback: Arc<Mutex<Result<RawResponse, FetchError>>>,
    delay: Option<Duration>,
    pub calls: Arc<Mutex<Vec<RecordedCall>>>,
}

impl FakeFetcher {
    pub fn always(resp: Result<RawResponse, FetchError>) -> Self {
        Self {
            queue: Arc::new(Mutex::new(VecDeque::new())),
            fallback: Arc::new(Mutex::new(resp)),
            delay: None,
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Every response arrives only after `delay`.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn push(&self, resp: Result<RawResponse, FetchError>) {
        self.queue.lock().unwrap().push_back(resp);
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

impl Fetcher for FakeFetcher {
    fn api_base(&self) -> &str {
        "https://api.test"
    }

    async fn fetch(
        &self,
        url: &str,
        credential: Option<&Credential>,
    ) -> Result<RawResponse, FetchError> {
        self.calls.lock().unwrap().push(RecordedCall {
            url: url.to_string(),
            credential: credential.map(|c| c.expose().to_string()),
            at: tokio::time::Instant::now(),
        });
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        let next = self.queue.lock().unwrap().pop_front();
        match next {
            Some(r) => r,
            None => self.fallback.lock().unwrap().clone(),
        }
    }
}
