//! Top-level driver: search, extract hits, enrich repositories.

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::config::CrawlerConfig;
use crate::enricher::{DetailEnricher, TaskPool};
use crate::error::Result;
use crate::extract::{Extract, SearchResultExtractor};
use crate::fetcher::{HttpFetcher, PageFetcher, PageKind};
use crate::types::{RunPhase, SearchOutcome, SearchQuery, SearchRecord};

/// Composes fetcher, extractors and enricher into a single `run` call.
pub struct SearchOrchestrator<F = HttpFetcher> {
    config: CrawlerConfig,
    fetcher: Arc<F>,
    search_extractor: SearchResultExtractor,
    enricher: DetailEnricher<F>,
}

impl SearchOrchestrator<HttpFetcher> {
    /// Create a new orchestrator talking HTTP through the configured proxies.
    pub fn new(config: CrawlerConfig) -> Result<Self> {
        config.validate()?;
        let fetcher = HttpFetcher::new(config.proxies.clone())?;
        Self::with_fetcher(config, fetcher)
    }
}

impl<F> SearchOrchestrator<F>
where
    F: PageFetcher + 'static,
{
    /// Create an orchestrator around any [`PageFetcher`].
    pub fn with_fetcher(config: CrawlerConfig, fetcher: F) -> Result<Self> {
        config.validate()?;
        let fetcher = Arc::new(fetcher);
        let pool = TaskPool::new(config.max_parallel)?;
        let enricher = DetailEnricher::new(Arc::clone(&fetcher), pool, config.task_timeout)?
            .with_progress(config.show_progress);

        Ok(SearchOrchestrator {
            search_extractor: SearchResultExtractor::new(config.base_url.clone())?,
            config,
            fetcher,
            enricher,
        })
    }

    pub fn fetcher(&self) -> &F {
        &self.fetcher
    }

    /// Run one search and, for repository searches, enrich every hit.
    ///
    /// Fetch failures never surface as errors: a failed search page ends the
    /// run with [`RunPhase::SearchFailed`], failed detail pages are left out
    /// of `records` and listed in `failures`.
    pub async fn run(&self, query: &SearchQuery) -> SearchOutcome {
        let q = query.query_string();
        let search_type = query.search_type.query_value();
        let search_url = self.config.search_url();

        info!(query = %q, search_type = %query.search_type, "searching");
        let fetched = self
            .fetcher
            .fetch(
                PageKind::Search,
                &search_url,
                &[("q", q.as_str()), ("type", search_type.as_str())],
            )
            .await;
        // The parsed page is not Send; keep it out of the enrichment await.
        let hits = match fetched {
            Ok(page) => self.search_extractor.extract(&page),
            Err(failure) => {
                warn!(%failure, "search failed");
                return SearchOutcome::search_failed(failure);
            }
        };
        let hits_found = hits.len();
        info!(hits = hits_found, "search succeeded");

        if !query.search_type.enriches() {
            debug!(search_type = %query.search_type, "no enrichment for this search type");
            return SearchOutcome {
                phase: RunPhase::Searched,
                hits_found,
                records: hits.into_iter().map(SearchRecord::Hit).collect(),
                failures: Vec::new(),
            };
        }

        debug!(
            hits = hits_found,
            workers = self.enricher.pool().size(),
            "enriching repositories"
        );
        let enrichment = self.enricher.enrich(&hits).await;

        SearchOutcome {
            phase: RunPhase::Enriched,
            hits_found,
            records: enrichment
                .details
                .into_iter()
                .map(SearchRecord::Detail)
                .collect(),
            failures: enrichment.failures,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::enricher::tests::MockFetcher;
    use crate::error::{CrawlerError, FetchFailure};
    use crate::proxy::ProxyPool;
    use crate::types::{RepositoryDetail, SearchHit, SearchType};
    use pretty_assertions::assert_eq;
    use std::collections::BTreeMap;

    const SEARCH_URL: &str = "https://github.com/search";
    const SEARCH_HTML: &str = r#"
        <html>
            <div class='search-title'><a href='/repo1'>Repo 1</a></div>
        </html>
    "#;

    fn config() -> CrawlerConfig {
        CrawlerConfig::new(ProxyPool::new(["proxy1"]).unwrap())
    }

    fn query(search_type: SearchType) -> SearchQuery {
        SearchQuery::new(vec!["keyword1".into()], search_type)
    }

    #[tokio::test]
    async fn repositories_search_replaces_hits_with_details() {
        let fetcher = MockFetcher::default()
            .with_page(SEARCH_URL, SEARCH_HTML)
            .with_page("https://github.com/repo1", SEARCH_HTML);
        let orchestrator = SearchOrchestrator::with_fetcher(config(), fetcher).unwrap();

        let outcome = orchestrator.run(&query(SearchType::Repositories)).await;

        assert_eq!(outcome.phase, RunPhase::Enriched);
        assert_eq!(outcome.hits_found, 1);
        assert_eq!(
            outcome.records,
            vec![SearchRecord::Detail(RepositoryDetail {
                url: "https://github.com/repo1".into(),
                owner: None,
                language_stats: BTreeMap::new(),
            })]
        );
        assert_eq!(orchestrator.fetcher().calls(), 2);
    }

    #[tokio::test]
    async fn other_search_types_skip_enrichment() {
        for search_type in [SearchType::Issues, SearchType::Wikis] {
            let fetcher = MockFetcher::default().with_page(SEARCH_URL, SEARCH_HTML);
            let orchestrator = SearchOrchestrator::with_fetcher(config(), fetcher).unwrap();

            let outcome = orchestrator.run(&query(search_type)).await;

            assert_eq!(outcome.phase, RunPhase::Searched);
            assert_eq!(
                outcome.records,
                vec![SearchRecord::Hit(SearchHit {
                    url: "https://github.com/repo1".into()
                })]
            );
            assert_eq!(orchestrator.fetcher().calls(), 1);
        }
    }

    #[tokio::test]
    async fn failed_search_ends_the_run() {
        let fetcher = MockFetcher::default().with_status(SEARCH_URL, 503);
        let orchestrator = SearchOrchestrator::with_fetcher(config(), fetcher).unwrap();

        let outcome = orchestrator.run(&query(SearchType::Repositories)).await;

        assert_eq!(outcome.phase, RunPhase::SearchFailed);
        assert!(outcome.records.is_empty());
        assert_eq!(outcome.failures.len(), 1);
        assert_eq!(outcome.failures[0].status(), Some(503));
        assert!(outcome.failures[0]
            .to_string()
            .starts_with("Failed to retrieve search results"));
        assert_eq!(orchestrator.fetcher().calls(), 1);
    }

    #[tokio::test]
    async fn all_details_failing_is_distinguishable_from_no_hits() {
        let fetcher = MockFetcher::default()
            .with_page(SEARCH_URL, SEARCH_HTML)
            .with_status("https://github.com/repo1", 500);
        let orchestrator = SearchOrchestrator::with_fetcher(config(), fetcher).unwrap();

        let outcome = orchestrator.run(&query(SearchType::Repositories)).await;

        assert_eq!(outcome.phase, RunPhase::Enriched);
        assert_eq!(outcome.hits_found, 1);
        assert!(outcome.records.is_empty());
        assert!(matches!(
            outcome.failures.as_slice(),
            [FetchFailure::Status { status: 500, .. }]
        ));
    }

    #[test]
    fn invalid_config_fails_before_any_fetch() {
        let fetcher = MockFetcher::default();
        let result = SearchOrchestrator::with_fetcher(config().with_max_parallel(0), fetcher);
        assert!(matches!(result, Err(CrawlerError::Config(_))));
    }
}
