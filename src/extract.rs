//! Structured field extraction from fetched pages.
//!
//! Each kind of page has its own extractor; all of them expose the same
//! [`Extract`] capability. Selectors are compiled once when the extractor is
//! built, so extraction itself is pure and cannot fail: missing elements
//! become absent or empty fields.

use std::collections::BTreeMap;

use scraper::{ElementRef, Selector};
use tracing::debug;

use crate::error::{CrawlerError, Result};
use crate::fetcher::Page;
use crate::types::{RepositoryDetail, SearchHit};

const HIT_CONTAINER: &str = "div.search-title";
const HIT_ANCHOR: &str = "a";
const OWNER: &str = "span.author a";
const LANGUAGE_LINKS: &str =
    "div.Layout-sidebar ul.list-style-none li.d-inline a.Link--secondary";
const LANGUAGE_PARTS: &str = "span";

/// Turns a parsed page into a record.
pub trait Extract {
    type Output;

    fn extract(&self, page: &Page) -> Self::Output;
}

fn selector(css: &str) -> Result<Selector> {
    Selector::parse(css).map_err(|e| CrawlerError::Parse(format!("invalid selector {css}: {e:?}")))
}

fn trimmed_text(element: ElementRef<'_>) -> String {
    element.text().collect::<String>().trim().to_string()
}

/// Pulls hit URLs out of a search listing.
#[derive(Debug, Clone)]
pub struct SearchResultExtractor {
    host: String,
    container: Selector,
    anchor: Selector,
}

impl SearchResultExtractor {
    /// `host` is prefixed to every relative hit href.
    pub fn new(host: impl Into<String>) -> Result<Self> {
        Ok(Self {
            host: host.into(),
            container: selector(HIT_CONTAINER)?,
            anchor: selector(HIT_ANCHOR)?,
        })
    }
}

impl Extract for SearchResultExtractor {
    type Output = Vec<SearchHit>;

    fn extract(&self, page: &Page) -> Vec<SearchHit> {
        let hits: Vec<SearchHit> = page
            .document
            .select(&self.container)
            .filter_map(|container| container.select(&self.anchor).next())
            .filter_map(|anchor| anchor.value().attr("href"))
            .map(|href| SearchHit {
                url: format!("{}{}", self.host, href),
            })
            .collect();

        debug!(url = %page.url, count = hits.len(), "search hits parsed");
        hits
    }
}

/// Reads owner and language statistics from a repository page.
#[derive(Debug, Clone)]
pub struct RepositoryDetailExtractor {
    owner: Selector,
    languages: Selector,
    language_parts: Selector,
}

impl RepositoryDetailExtractor {
    pub fn new() -> Result<Self> {
        Ok(Self {
            owner: selector(OWNER)?,
            languages: selector(LANGUAGE_LINKS)?,
            language_parts: selector(LANGUAGE_PARTS)?,
        })
    }

    /// Trimmed byline text; whitespace-only text counts as no owner rather than `""`.
    fn owner(&self, page: &Page) -> Option<String> {
        page.document
            .select(&self.owner)
            .next()
            .map(trimmed_text)
            .filter(|owner| !owner.is_empty())
    }

    fn language_stats(&self, page: &Page) -> BTreeMap<String, String> {
        let mut stats = BTreeMap::new();
        for link in page.document.select(&self.languages) {
            let parts: Vec<String> = link.select(&self.language_parts).map(trimmed_text).collect();
            match <[String; 2]>::try_from(parts) {
                Ok([language, percentage]) => {
                    stats.insert(language, percentage);
                }
                Err(parts) => {
                    debug!(url = %page.url, spans = parts.len(), "skipping malformed language entry");
                }
            }
        }
        stats
    }
}

impl Extract for RepositoryDetailExtractor {
    type Output = RepositoryDetail;

    fn extract(&self, page: &Page) -> RepositoryDetail {
        RepositoryDetail {
            url: page.url.clone(),
            owner: self.owner(page),
            language_stats: self.language_stats(page),
        }
    }
}
