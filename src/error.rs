use thiserror::Error;

/// Failure of a single resource fetch. Converted into `Failed` poller state,
/// never propagated into rendering.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    #[error("network error: {0}")]
    Network(String),

    #[error("{status_text} ({status})")]
    Http { status: u16, status_text: String },

    #[error("unexpected response body: {0}")]
    Decode(String),
}

#[derive(Error, Debug)]
pub enum RepolensError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error("{0}")]
    Validation(String),

    #[error("storage error: {0}")]
    Storage(String),

    #[error("invalid route: {0}")]
    Route(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, RepolensError>;
