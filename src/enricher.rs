//! Bounded concurrent enrichment of repository hits.
//!
//! Every hit gets its own tokio task. Tasks wait on a shared [`TaskPool`]
//! permit before touching the network, so at most `TaskPool::size` detail
//! pages are in flight. Results are gathered as tasks finish; a failing task
//! only adds an entry to [`Enrichment::failures`].

use std::sync::Arc;
use std::time::Duration;

use futures::stream::{FuturesUnordered, StreamExt};
use indicatif::{ProgressBar, ProgressStyle};
use tokio::sync::Semaphore;
use tracing::{debug, info, warn};

use crate::error::{CrawlerError, FetchFailure, Result};
use crate::extract::{Extract, RepositoryDetailExtractor};
use crate::fetcher::{PageFetcher, PageKind};
use crate::types::{RepositoryDetail, SearchHit};

/// A fixed number of worker slots, reusable across runs.
#[derive(Debug, Clone)]
pub struct TaskPool {
    permits: Arc<Semaphore>,
    size: usize,
}

impl TaskPool {
    pub fn new(size: usize) -> Result<Self> {
        if size == 0 {
            return Err(CrawlerError::Config(
                "task pool size must be greater than 0".into(),
            ));
        }
        Ok(Self {
            permits: Arc::new(Semaphore::new(size)),
            size,
        })
    }

    pub fn size(&self) -> usize {
        self.size
    }

    /// Slots not currently held by a running task.
    pub fn available(&self) -> usize {
        self.permits.available_permits()
    }
}

/// Details that were fetched, and the hits that produced nothing.
#[derive(Debug, Clone, Default)]
pub struct Enrichment {
    pub details: Vec<RepositoryDetail>,
    pub failures: Vec<FetchFailure>,
}

/// Fans out one fetch + extract per hit.
pub struct DetailEnricher<F> {
    fetcher: Arc<F>,
    extractor: Arc<RepositoryDetailExtractor>,
    pool: TaskPool,
    task_timeout: Duration,
    show_progress: bool,
}

impl<F> DetailEnricher<F>
where
    F: PageFetcher + 'static,
{
    pub fn new(fetcher: Arc<F>, pool: TaskPool, task_timeout: Duration) -> Result<Self> {
        Ok(Self {
            fetcher,
            extractor: Arc::new(RepositoryDetailExtractor::new()?),
            pool,
            task_timeout,
            show_progress: false,
        })
    }

    pub fn with_progress(mut self, show_progress: bool) -> Self {
        self.show_progress = show_progress;
        self
    }

    pub fn pool(&self) -> &TaskPool {
        &self.pool
    }

    /// Fetch and extract every hit's detail page.
    ///
    /// Waits for all tasks. Output order follows completion order.
    pub async fn enrich(&self, hits: &[SearchHit]) -> Enrichment {
        let progress = self.progress_bar(hits.len());
        let mut tasks = FuturesUnordered::new();

        for hit in hits {
            let url = hit.url.clone();
            let task_url = url.clone();
            let fetcher = Arc::clone(&self.fetcher);
            let extractor = Arc::clone(&self.extractor);
            let permits = Arc::clone(&self.pool.permits);
            let task_timeout = self.task_timeout;

            let handle = tokio::spawn(async move {
                // Wait for a free worker slot
                let Ok(_permit) = permits.acquire_owned().await else {
                    return Err(FetchFailure::Aborted {
                        url: task_url,
                        reason: "task pool closed".into(),
                    });
                };
                fetch_detail(fetcher.as_ref(), &extractor, &task_url, task_timeout).await
            });

            tasks.push(async move { (url, handle.await) });
        }

        let mut enrichment = Enrichment::default();
        while let Some((url, joined)) = tasks.next().await {
            match joined {
                Ok(Ok(detail)) => {
                    debug!(url = %detail.url, "repository enriched");
                    enrichment.details.push(detail);
                }
                Ok(Err(failure)) => {
                    warn!(%failure, "detail fetch failed");
                    enrichment.failures.push(failure);
                }
                Err(e) => {
                    warn!(url = %url, error = %e, "detail task aborted");
                    enrichment.failures.push(FetchFailure::Aborted {
                        url,
                        reason: e.to_string(),
                    });
                }
            }
            progress.inc(1);
        }

        progress.finish_and_clear();
        info!(
            enriched = enrichment.details.len(),
            failed = enrichment.failures.len(),
            "enrichment finished"
        );
        enrichment
    }

    fn progress_bar(&self, len: usize) -> ProgressBar {
        if !self.show_progress {
            return ProgressBar::hidden();
        }
        let pb = ProgressBar::new(len as u64);
        if let Ok(style) =
            ProgressStyle::default_bar().template("[{elapsed_precise}] {bar:40.cyan/blue} {pos:>7}/{len:7} {wide_msg}")
        {
            pb.set_style(style.progress_chars("=>-"));
        }
        pb.set_message("Fetching repository details");
        pb
    }
}

async fn fetch_detail<F: PageFetcher>(
    fetcher: &F,
    extractor: &RepositoryDetailExtractor,
    url: &str,
    task_timeout: Duration,
) -> std::result::Result<RepositoryDetail, FetchFailure> {
    let fetched = tokio::time::timeout(task_timeout, fetcher.fetch(PageKind::Repository, url, &[])).await;
    let page = match fetched {
        Ok(page) => page?,
        Err(_) => {
            return Err(FetchFailure::Timeout {
                kind: PageKind::Repository,
                url: url.to_string(),
                timeout_ms: u64::try_from(task_timeout.as_millis()).unwrap_or(u64::MAX),
            })
        }
    };
    Ok(extractor.extract(&page))
}
