use crate::error::{RepolensError, Result};
use crate::github::client::Fetcher;
use crate::storage::KeyValueStore;
use std::fmt;
use std::time::Duration;
use tracing::{info, warn};

pub const TOKEN_KEY: &str = "github-token";

pub const INVALID_TOKEN_MSG: &str = "Invalid token. Please check and try again.";
pub const CONNECT_FAILED_MSG: &str = "Error connecting to GitHub. Please try again.";

pub const VALIDATION_TIMEOUT: Duration = Duration::from_secs(15);

/// Personal access token. Never printed by `Debug`.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credential([REDACTED])")
    }
}

/// Checks a candidate token against `GET /user`. Gives up after
/// `VALIDATION_TIMEOUT` with the connection message.
pub async fn validate<F: Fetcher>(fetcher: &F, value: &str) -> Result<Credential> {
    let candidate = Credential::new(value.trim());
    let url = format!("{}/user", fetcher.api_base());
    let resp = match tokio::time::timeout(VALIDATION_TIMEOUT, fetcher.fetch(&url, Some(&candidate))).await {
        Ok(Ok(resp)) => resp,
        Ok(Err(e)) => {
            warn!("token validation failed: {e}");
            return Err(RepolensError::Validation(CONNECT_FAILED_MSG.to_string()));
        }
        Err(_) => {
            warn!(timeout = ?VALIDATION_TIMEOUT, "token validation timed out");
            return Err(RepolensError::Validation(CONNECT_FAILED_MSG.to_string()));
        }
    };

    if resp.status.as_u16() == 401 {
        warn!("token rejected by API");
        return Err(RepolensError::Validation(INVALID_TOKEN_MSG.to_string()));
    }
    if !resp.is_success() {
        warn!(status = resp.status.as_u16(), "token validation failed");
        return Err(RepolensError::Validation(format!(
            "Error validating token: {}",
            resp.status_text
        )));
    }
    Ok(candidate)
}

/// Owns the session credential and its durable copy. The only writer.
pub struct TokenStore<S: KeyValueStore> {
    store: S,
    current: Option<Credential>,
    loaded: bool,
}

impl<S: KeyValueStore> TokenStore<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            current: None,
            loaded: false,
        }
    }

    /// Current credential; the durable copy is consulted on first read only.
    pub fn get(&mut self) -> Option<Credential> {
        if self.current.is_none() && !self.loaded {
            self.loaded = true;
            match self.store.get(TOKEN_KEY) {
                Ok(Some(token)) if !token.is_empty() => self.current = Some(Credential::new(token)),
                Ok(_) => {}
                Err(e) => warn!("could not read stored token: {e}"),
            }
        }
        self.current.clone()
    }

    /// Validates `value` and adopts it on success. An empty value clears
    /// the token without touching the network. On a validation failure the
    /// previous credential is kept.
    pub async fn set<F: Fetcher>(&mut self, fetcher: &F, value: &str) -> Result<Option<Credential>> {
        if value.trim().is_empty() {
            self.clear()?;
            return Ok(None);
        }
        let candidate = validate(fetcher, value).await?;
        self.adopt(candidate.clone())?;
        Ok(Some(candidate))
    }

    /// Persists an already validated credential and makes it current.
    pub fn adopt(&mut self, credential: Credential) -> Result<()> {
        self.store.set(TOKEN_KEY, credential.expose())?;
        self.current = Some(credential);
        self.loaded = true;
        info!("token validated and stored");
        Ok(())
    }

    pub fn clear(&mut self) -> Result<()> {
        self.store.remove(TOKEN_KEY)?;
        self.current = None;
        self.loaded = true;
        info!("token cleared");
        Ok(())
    }
}
