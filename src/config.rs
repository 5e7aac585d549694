//! Crawler configuration with sensible defaults.

use std::time::Duration;

use url::Url;

use crate::error::{CrawlerError, Result};
use crate::proxy::ProxyPool;

/// Host prefix for search hits and the search endpoint.
pub const GITHUB_HOST: &str = "https://github.com";

/// Worker count used when none is configured.
pub const DEFAULT_MAX_PARALLEL: usize = 5;

/// Per detail page timeout used when none is configured.
pub const DEFAULT_TASK_TIMEOUT: Duration = Duration::from_secs(30);

/// Settings for one crawler instance.
#[derive(Debug, Clone)]
pub struct CrawlerConfig {
    /// Scheme and host every hit path is appended to, without trailing slash.
    pub base_url: String,
    /// Proxies requests are routed through, one picked per request.
    pub proxies: ProxyPool,
    /// Upper bound on concurrently running detail fetches.
    pub max_parallel: usize,
    /// Deadline for a single detail fetch.
    pub task_timeout: Duration,
    /// Draw an enrichment progress bar on stderr.
    pub show_progress: bool,
}

impl CrawlerConfig {
    pub fn new(proxies: ProxyPool) -> Self {
        Self {
            base_url: GITHUB_HOST.to_string(),
            proxies,
            max_parallel: DEFAULT_MAX_PARALLEL,
            task_timeout: DEFAULT_TASK_TIMEOUT,
            show_progress: false,
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_max_parallel(mut self, max_parallel: usize) -> Self {
        self.max_parallel = max_parallel;
        self
    }

    pub fn with_task_timeout(mut self, task_timeout: Duration) -> Self {
        self.task_timeout = task_timeout;
        self
    }

    pub fn with_progress(mut self, show_progress: bool) -> Self {
        self.show_progress = show_progress;
        self
    }

    /// Search endpoint on the configured host.
    pub fn search_url(&self) -> String {
        format!("{}/search", self.base_url.trim_end_matches('/'))
    }

    /// Validates this configuration, returning an error if any field is invalid.
    ///
    /// Checks:
    /// - the proxy pool is not empty
    /// - `max_parallel` is greater than 0
    /// - `task_timeout` is not zero
    /// - `base_url` is an absolute http(s) URL
    pub fn validate(&self) -> Result<()> {
        if self.proxies.is_empty() {
            return Err(CrawlerError::Config("proxy pool is empty".into()));
        }
        if self.max_parallel == 0 {
            return Err(CrawlerError::Config(
                "max_parallel must be greater than 0".into(),
            ));
        }
        if self.task_timeout.is_zero() {
            return Err(CrawlerError::Config(
                "task_timeout must be greater than 0".into(),
            ));
        }
        let base = Url::parse(&self.base_url)
            .map_err(|e| CrawlerError::Config(format!("invalid base url {}: {e}", self.base_url)))?;
        if !matches!(base.scheme(), "http" | "https") {
            return Err(CrawlerError::Config(format!(
                "base url must be http or https, got {}",
                base.scheme()
            )));
        }
        Ok(())
    }
}
