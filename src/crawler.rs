use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use thiserror::Error;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio::time::{Instant, timeout_at};
use tokio_util::sync::CancellationToken;

use crate::config::CrawlerConfig;

const DESKTOP_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0 Safari/537.36";
const MOBILE_USER_AGENT: &str = "Mozilla/5.0 (iPhone; CPU iPhone OS 17_4 like Mac OS X) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.4 Mobile/15E148 Safari/604.1";

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("crawler pool is closed")]
    PoolClosed,
    #[error("could not build http client: {0}")]
    Client(#[from] reqwest::Error),
}

/// Fetches a batch of pages under one shared deadline.
///
/// The returned map may hold any subset of `urls`; a missing url means the
/// page failed or did not finish in time. `Err` is reserved for the fetcher
/// itself being unusable.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    async fn fetch_pages(
        &self,
        urls: &[String],
        settle_delay: Duration,
        total_budget: Duration,
    ) -> Result<HashMap<String, String>, FetchError>;
}

/// Process-wide pool of page fetchers sharing one concurrency cap.
pub struct CrawlerPool {
    client: Client,
    permits: Arc<Semaphore>,
    page_timeout: Duration,
    shutdown: CancellationToken,
}

impl CrawlerPool {
    pub fn new(config: &CrawlerConfig) -> Result<CrawlerPool, FetchError> {
        let user_agent = if config.mobile {
            MOBILE_USER_AGENT
        } else {
            DESKTOP_USER_AGENT
        };
        let mut builder = Client::builder().user_agent(user_agent);
        if let Some(proxy) = &config.proxy {
            builder = builder.proxy(reqwest::Proxy::all(proxy)?);
        }
        Ok(CrawlerPool {
            client: builder.build()?,
            permits: Arc::new(Semaphore::new(config.max_crawlers.max(1))),
            page_timeout: config.page_timeout,
            shutdown: CancellationToken::new(),
        })
    }

    pub fn is_closed(&self) -> bool {
        self.shutdown.is_cancelled()
    }

    /// Releases the pool. In-flight batches return what they have so far and
    /// later calls fail with `PoolClosed`. Safe to call more than once.
    pub fn close(&self) {
        if self.shutdown.is_cancelled() {
            return;
        }
        self.shutdown.cancel();
        self.permits.close();
        log::info!("closed crawler pool");
    }

    async fn fetch_page(
        client: Client,
        permits: Arc<Semaphore>,
        url: String,
        page_timeout: Duration,
        settle_delay: Duration,
    ) -> Option<(String, String)> {
        // acquire fails only once the pool is closed
        let _permit = permits.acquire_owned().await.ok()?;
        let res = match client.get(&url).timeout(page_timeout).send().await {
            Ok(res) => res,
            Err(e) => {
                log::debug!("error fetching page {url}, error: {:#}", e);
                return None;
            }
        };
        if !res.status().is_success() {
            log::debug!("error fetching page {url}, status: {}", res.status());
            return None;
        }
        if !settle_delay.is_zero() {
            tokio::time::sleep(settle_delay).await;
        }
        match res.text().await {
            Ok(body) => Some((url, body)),
            Err(e) => {
                log::debug!("error reading page {url}, error: {:#}", e);
                None
            }
        }
    }
}

#[async_trait]
impl PageFetcher for CrawlerPool {
    async fn fetch_pages(
        &self,
        urls: &[String],
        settle_delay: Duration,
        total_budget: Duration,
    ) -> Result<HashMap<String, String>, FetchError> {
        if self.is_closed() {
            return Err(FetchError::PoolClosed);
        }
        let deadline = Instant::now() + total_budget;

        let mut seen = HashSet::new();
        let mut tasks = JoinSet::new();
        for url in urls {
            if !seen.insert(url.as_str()) {
                continue;
            }
            tasks.spawn(Self::fetch_page(
                self.client.clone(),
                self.permits.clone(),
                url.clone(),
                self.page_timeout,
                settle_delay,
            ));
        }

        let mut pages = HashMap::new();
        let collect = async {
            while let Some(joined) = tasks.join_next().await {
                match joined {
                    Ok(Some((url, body))) => {
                        pages.insert(url, body);
                    }
                    Ok(None) => {}
                    Err(e) => log::warn!("page fetch task failed: {e}"),
                }
            }
        };
        tokio::select! {
            _ = timeout_at(deadline, collect) => {}
            _ = self.shutdown.cancelled() => {}
        }
        // anything still running missed the budget
        tasks.abort_all();

        log::info!("fetched {}/{} pages", pages.len(), seen.len());
        Ok(pages)
    }
}

impl Drop for CrawlerPool {
    fn drop(&mut self) {
        self.close();
    }
}
