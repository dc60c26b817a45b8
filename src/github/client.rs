use crate::error::FetchError;
use crate::token::Credential;
use reqwest::header::{HeaderMap, ACCEPT, AUTHORIZATION, USER_AGENT};
use reqwest::StatusCode;
use std::future::Future;
use tracing::debug;

pub const DEFAULT_API_BASE: &str = "https://api.github.com";
pub const ACCEPT_MEDIA_TYPE: &str = "application/vnd.github.v3+json";
const CLIENT_USER_AGENT: &str = concat!("repolens/", env!("CARGO_PKG_VERSION"));

/// Uninterpreted response: callers decide what the status means.
#[derive(Debug, Clone)]
pub struct RawResponse {
    pub status: StatusCode,
    pub status_text: String,
    pub headers: HeaderMap,
    pub body: Vec<u8>,
}

impl RawResponse {
    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }
}

/// Seam between the poller and the network.
pub trait Fetcher: Send + Sync + 'static {
    fn api_base(&self) -> &str;

    fn fetch(
        &self,
        url: &str,
        credential: Option<&Credential>,
    ) -> impl Future<Output = Result<RawResponse, FetchError>> + Send;
}

#[derive(Clone)]
pub struct GitHubClient {
    http: reqwest::Client,
    api_base: String,
}

impl GitHubClient {
    pub fn new(api_base: &str) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_base: api_base.trim_end_matches('/').to_string(),
        }
    }
}

impl Fetcher for GitHubClient {
    fn api_base(&self) -> &str {
        &self.api_base
    }

    async fn fetch(
        &self,
        url: &str,
        credential: Option<&Credential>,
    ) -> Result<RawResponse, FetchError> {
        let mut req = self
            .http
            .get(url)
            .header(ACCEPT, ACCEPT_MEDIA_TYPE)
            .header(USER_AGENT, CLIENT_USER_AGENT);
        if let Some(cred) = credential {
            req = req.header(AUTHORIZATION, format!("token {}", cred.expose()));
        }

        debug!(url, authenticated = credential.is_some(), "GET");
        let resp = req
            .send()
            .await
            .map_err(|e| FetchError::Network(e.to_string()))?;

        let status = resp.status();
        let headers = resp.headers().clone();
        let body = resp
            .bytes()
            .await
            .map_err(|e| FetchError::Network(e.to_string()))?
            .to_vec();

        debug!(url, status = status.as_u16(), bytes = body.len(), "response");
        Ok(RawResponse {
            status,
            status_text: status_text(status),
            headers,
            body,
        })
    }
}

fn status_text(status: StatusCode) -> String {
    status
        .canonical_reason()
        .map(String::from)
        .unwrap_or_else(|| status.as_u16().to_string())
}
