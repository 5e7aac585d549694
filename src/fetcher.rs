//! Single-page fetching through a randomly chosen proxy.
//!
//! [`HttpFetcher`] keeps one [`reqwest::Client`] per configured proxy, each
//! preloaded with browser-like headers, and picks one at random for every
//! request. Non-200 answers come back as [`FetchFailure`] values rather than
//! errors so callers decide what a missing page means.

use std::future::Future;

use reqwest::header::{self, HeaderMap, HeaderValue};
use reqwest::{Client, Proxy, StatusCode};
use scraper::Html;
use tracing::{debug, warn};

use crate::error::{CrawlerError, FetchFailure, Result};
use crate::proxy::ProxyPool;

const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/58.0.3029.110 Safari/537.3";

/// Which endpoint a page comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PageKind {
    Search,
    Repository,
}

impl PageKind {
    pub fn failure_message(self) -> &'static str {
        match self {
            Self::Search => "Failed to retrieve search results",
            Self::Repository => "Failed to retrieve repository",
        }
    }
}

/// A fetched and parsed HTML page.
#[derive(Debug)]
pub struct Page {
    pub url: String,
    pub document: Html,
}

impl Page {
    pub fn parse(url: impl Into<String>, html: &str) -> Self {
        Self {
            url: url.into(),
            document: Html::parse_document(html),
        }
    }
}

/// Something that can turn a URL into a parsed page.
///
/// Implementations must be `Send + Sync` so detail fetches can run on
/// separate tasks.
pub trait PageFetcher: Send + Sync {
    /// Fetch `url` with the given query parameters.
    fn fetch(
        &self,
        kind: PageKind,
        url: &str,
        query: &[(&str, &str)],
    ) -> impl Future<Output = std::result::Result<Page, FetchFailure>> + Send;
}

/// Browser-like headers sent with every request.
pub fn browser_headers() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("text/html"));
    headers.insert(header::USER_AGENT, HeaderValue::from_static(USER_AGENT));
    headers.insert(
        header::ACCEPT,
        HeaderValue::from_static(
            "text/html,application/xhtml+xml,application/xml;q=0.9,image/webp,*/*;q=0.8",
        ),
    );
    headers.insert(
        header::ACCEPT_LANGUAGE,
        HeaderValue::from_static("en-US,en;q=0.5"),
    );
    headers.insert(header::CONNECTION, HeaderValue::from_static("keep-alive"));
    headers.insert(
        header::UPGRADE_INSECURE_REQUESTS,
        HeaderValue::from_static("1"),
    );
    headers
}

/// reqwest-backed fetcher routing every request through the proxy pool.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    proxies: ProxyPool,
    // Parallel to `proxies`: clients[i] routes through proxies[i].
    clients: Vec<Client>,
}

impl HttpFetcher {
    /// Create a new HttpFetcher, building one client per proxy.
    pub fn new(proxies: ProxyPool) -> Result<Self> {
        let clients = (0..proxies.len())
            .map(|index| {
                let proxy_url = proxies
                    .proxy_url(index)
                    .ok_or_else(|| CrawlerError::Config("proxy pool is empty".into()))?;
                let proxy = Proxy::all(&proxy_url)
                    .map_err(|e| CrawlerError::Config(format!("invalid proxy {proxy_url}: {e}")))?;
                Client::builder()
                    .default_headers(browser_headers())
                    .proxy(proxy)
                    .build()
                    .map_err(|e| CrawlerError::Http(format!("failed to build HTTP client: {e}")))
            })
            .collect::<Result<Vec<_>>>()?;

        if clients.is_empty() {
            return Err(CrawlerError::Config("proxy pool is empty".into()));
        }

        Ok(HttpFetcher { proxies, clients })
    }

    fn pick_client(&self) -> (usize, &Client) {
        let index = self.proxies.pick_index();
        (index, &self.clients[index])
    }
}

impl PageFetcher for HttpFetcher {
    async fn fetch(
        &self,
        kind: PageKind,
        url: &str,
        query: &[(&str, &str)],
    ) -> std::result::Result<Page, FetchFailure> {
        let (index, client) = self.pick_client();
        debug!(url, proxy = %self.proxies.as_slice()[index], ?kind, "requesting page");

        let transport = |e: reqwest::Error| FetchFailure::Transport {
            kind,
            url: url.to_string(),
            reason: e.to_string(),
        };

        let response = client
            .get(url)
            .query(query)
            .send()
            .await
            .map_err(transport)?;

        let status = response.status();
        if status != StatusCode::OK {
            let failure = FetchFailure::Status {
                kind,
                url: url.to_string(),
                status: status.as_u16(),
            };
            warn!("{failure}");
            return Err(failure);
        }

        let body = response.text().await.map_err(transport)?;
        debug!(url, bytes = body.len(), "page received");

        Ok(Page::parse(url, &body))
    }
}
