//! # GitHub Crawler
//!
//! A Rust library for crawling GitHub's HTML search through a pool of
//! proxies, extracting hits with CSS selectors and enriching repository hits
//! with owner and language statistics fetched concurrently.
//!
//! ## Main Components
//!
//! - [`SearchOrchestrator`]: runs one search and, for repository searches,
//!   the enrichment fan-out
//! - [`DetailEnricher`] and [`TaskPool`]: bounded concurrent detail fetching
//! - [`HttpFetcher`]: proxy-rotating page fetcher behind the [`PageFetcher`] seam
//! - [`SearchResultExtractor`] and [`RepositoryDetailExtractor`]: page parsers
//! - [`Args`]: command line arguments with interactive fallback
//!
//! ## Example
//!
//! ```no_run
//! use github_crawler_lib::{CrawlerConfig, ProxyPool, SearchOrchestrator, SearchQuery, SearchType};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
//!     let proxies = ProxyPool::new(["194.126.37.94:8080", "13.78.125.167:8080"])?;
//!     let orchestrator = SearchOrchestrator::new(CrawlerConfig::new(proxies))?;
//!
//!     let query = SearchQuery::new(vec!["openstack".into(), "nova".into()], SearchType::Repositories);
//!     let outcome = orchestrator.run(&query).await;
//!
//!     println!("{}", outcome.to_json()?);
//!     Ok(())
//! }
//! ```

mod args;
pub mod config;
pub mod enricher;
pub mod error;
pub mod extract;
pub mod fetcher;
pub mod orchestrator;
pub mod proxy;
pub mod types;

// Re-export main components for documentation and external use
pub use crate::args::{read_input, Args, RawInput};
pub use crate::config::CrawlerConfig;
pub use crate::enricher::{DetailEnricher, Enrichment, TaskPool};
pub use crate::error::{CrawlerError, FetchFailure, Result};
pub use crate::extract::{Extract, RepositoryDetailExtractor, SearchResultExtractor};
pub use crate::fetcher::{HttpFetcher, Page, PageFetcher, PageKind};
pub use crate::orchestrator::SearchOrchestrator;
pub use crate::proxy::ProxyPool;
pub use crate::types::{
    RepositoryDetail, RunPhase, SearchHit, SearchOutcome, SearchQuery, SearchRecord, SearchType,
};
