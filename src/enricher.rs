use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use futures::StreamExt;
use futures::stream::FuturesUnordered;

use crate::crawler::PageFetcher;
use crate::data_models::OrganicResult;
use crate::extractor::{ContentExtractor, ExtractError, TextExtractor};

/// What happened to one fetched page.
#[derive(Debug)]
pub enum PageOutcome {
    Extracted(String),
    Failed(ExtractError),
    /// The extraction task itself died.
    Aborted(String),
}

/// Counts from one enrichment pass, mostly for logging.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct EnrichmentSummary {
    pub requested: usize,
    pub fetched: usize,
    pub extracted: usize,
    pub failed: usize,
    pub batch_failed: bool,
}

/// Attaches extracted page text to search results.
pub struct Enricher {
    fetcher: Arc<dyn PageFetcher>,
    extractor: Arc<dyn TextExtractor>,
}

impl Enricher {
    pub fn new(fetcher: Arc<dyn PageFetcher>) -> Self {
        Self::with_extractor(fetcher, Arc::new(ContentExtractor))
    }

    pub fn with_extractor(fetcher: Arc<dyn PageFetcher>, extractor: Arc<dyn TextExtractor>) -> Self {
        Self { fetcher, extractor }
    }

    /// Unique links in first-seen order, each with every index that carries it.
    pub fn group_by_link(results: &[OrganicResult]) -> (Vec<String>, HashMap<String, Vec<usize>>) {
        let mut urls = Vec::new();
        let mut url_to_idx: HashMap<String, Vec<usize>> = HashMap::new();
        for (idx, res) in results.iter().enumerate() {
            let Some(link) = res.link().filter(|link| !link.is_empty()) else {
                continue;
            };
            url_to_idx
                .entry(link.to_string())
                .or_insert_with(|| {
                    urls.push(link.to_string());
                    Vec::new()
                })
                .push(idx);
        }
        (urls, url_to_idx)
    }

    /// Fetches every result page in one batch and sets `text_content` on the
    /// results whose page came back and converted cleanly. Never fails:
    /// everything else is left as it was.
    pub async fn enrich(
        &self,
        results: &mut [OrganicResult],
        total_budget: Duration,
    ) -> EnrichmentSummary {
        let (urls, url_to_idx) = Self::group_by_link(results);
        let mut summary = EnrichmentSummary {
            requested: urls.len(),
            ..Default::default()
        };
        if urls.is_empty() {
            return summary;
        }

        let pages = match self
            .fetcher
            .fetch_pages(&urls, Duration::ZERO, total_budget)
            .await
        {
            Ok(pages) => pages,
            Err(e) => {
                log::error!("unable to crawl, error: {:#}", e);
                summary.batch_failed = true;
                return summary;
            }
        };
        summary.fetched = pages.len();

        for (url, outcome) in self.extract_all(pages).await {
            let Some(indices) = url_to_idx.get(&url) else {
                log::debug!("crawler returned unrequested url {url}");
                continue;
            };
            match outcome {
                PageOutcome::Extracted(text) => {
                    summary.extracted += 1;
                    for &idx in indices {
                        results[idx].text_content = Some(text.clone());
                    }
                }
                PageOutcome::Failed(e) => {
                    summary.failed += 1;
                    log::warn!("fail parse page_source {url}, error: {:#}", e);
                }
                PageOutcome::Aborted(reason) => {
                    summary.failed += 1;
                    log::warn!("extraction aborted for {url}: {reason}");
                }
            }
        }

        log::info!(
            "enriched {}/{} results ({} pages fetched, {} failed)",
            summary.extracted,
            summary.requested,
            summary.fetched,
            summary.failed
        );
        summary
    }

    /// Extracts each page on the blocking pool so one bad page cannot take
    /// the others down with it.
    pub async fn extract_all(&self, pages: HashMap<String, String>) -> Vec<(String, PageOutcome)> {
        let mut tasks = pages
            .into_iter()
            .map(|(url, html)| {
                let extractor = self.extractor.clone();
                async move {
                    let handle = tokio::task::spawn_blocking(move || extractor.extract(&html));
                    let outcome = match handle.await {
                        Ok(Ok(text)) => PageOutcome::Extracted(text),
                        Ok(Err(e)) => PageOutcome::Failed(e),
                        Err(e) => PageOutcome::Aborted(e.to_string()),
                    };
                    (url, outcome)
                }
            })
            .collect::<FuturesUnordered<_>>();

        let mut outcomes = Vec::new();
        while let Some(outcome) = tasks.next().await {
            outcomes.push(outcome);
        }
        outcomes
    }
}
