//! Error types for the crawler.
//!
//! [`CrawlerError`] covers hard failures surfaced before any network
//! activity (bad configuration, client construction, invalid selectors) and
//! the I/O of the binary. [`FetchFailure`] describes a single page that could
//! not be fetched; it never aborts a run and is reported alongside results.

use crate::fetcher::PageKind;

/// Hard failures returned to the caller.
#[derive(Debug, thiserror::Error)]
pub enum CrawlerError {
    /// Invalid search type, empty proxy pool or other bad input.
    #[error("config error: {0}")]
    Config(String),

    /// The HTTP client could not be constructed.
    #[error("HTTP error: {0}")]
    Http(String),

    /// A CSS selector failed to compile.
    #[error("parse error: {0}")]
    Parse(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

/// Convenience type alias for crawler results.
pub type Result<T> = std::result::Result<T, CrawlerError>;

/// Why one page produced no data.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FetchFailure {
    /// The server answered with something other than 200.
    #[error("{}. Status code: {status} ({url})", .kind.failure_message())]
    Status {
        kind: PageKind,
        url: String,
        status: u16,
    },

    /// The request could not be sent or the body could not be read.
    #[error("{}: {reason} ({url})", .kind.failure_message())]
    Transport {
        kind: PageKind,
        url: String,
        reason: String,
    },

    /// The page did not arrive within the per-task timeout.
    #[error("{}: timed out after {timeout_ms}ms ({url})", .kind.failure_message())]
    Timeout {
        kind: PageKind,
        url: String,
        timeout_ms: u64,
    },

    /// The detail task ended without producing a result.
    #[error("detail task aborted: {reason} ({url})")]
    Aborted { url: String, reason: String },
}

impl FetchFailure {
    /// URL of the page that failed.
    pub fn url(&self) -> &str {
        match self {
            Self::Status { url, .. }
            | Self::Transport { url, .. }
            | Self::Timeout { url, .. }
            | Self::Aborted { url, .. } => url,
        }
    }

    /// HTTP status code, when the server answered at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}
