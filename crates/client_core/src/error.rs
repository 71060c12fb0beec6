use std::time::Duration;

use thiserror::Error;

/// Every way a collection fetch can fail. The list controller collapses all
/// of them into one user-facing message; the variants exist for logs.
#[derive(Debug, Error)]
pub enum NetworkError {
    #[error("invalid collection url '{url}': {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },
    #[error("request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("{url} returned HTTP {status}: {message}")]
    Status {
        url: String,
        status: u16,
        message: String,
    },
    #[error("malformed response from {url}: {reason}")]
    Malformed { url: String, reason: String },
    #[error("fetch timed out after {0:?}")]
    Timeout(Duration),
    /// The fetch task panicked or was cancelled before producing a result.
    #[error("fetch task ended abnormally: {0}")]
    TaskFailed(String),
}

impl NetworkError {
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("list controller runtime has stopped")]
pub struct RuntimeClosed;
