//! Outbound proxy pool with a fresh random pick per request.

use rand::Rng;

use crate::error::{CrawlerError, Result};

/// Read-only list of proxy addresses shared by every request of a run.
///
/// Never empty: [`ProxyPool::new`] is the only constructor and rejects empty input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProxyPool {
    proxies: Vec<String>,
}

impl ProxyPool {
    /// Build a pool from `host:port` entries (or full proxy URLs).
    ///
    /// # Errors
    ///
    /// Returns [`CrawlerError::Config`] if no non-blank entry is given.
    pub fn new<I, S>(proxies: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let proxies: Vec<String> = proxies
            .into_iter()
            .map(Into::into)
            .map(|p| p.trim().to_string())
            .filter(|p| !p.is_empty())
            .collect();
        if proxies.is_empty() {
            return Err(CrawlerError::Config("proxy pool is empty".into()));
        }
        Ok(Self { proxies })
    }

    pub fn len(&self) -> usize {
        self.proxies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.proxies.is_empty()
    }

    pub fn as_slice(&self) -> &[String] {
        &self.proxies
    }

    /// Index of a uniformly chosen proxy, drawn afresh on every call.
    pub fn pick_index(&self) -> usize {
        rand::thread_rng().gen_range(0..self.proxies.len())
    }

    /// Entry `index` as a URL reqwest accepts; bare `host:port` becomes `http://host:port`.
    pub fn proxy_url(&self, index: usize) -> Option<String> {
        self.proxies.get(index).map(|p| {
            if p.contains("://") {
                p.clone()
            } else {
                format!("http://{p}")
            }
        })
    }
}
