#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use llm_search::crawler::{FetchError, PageFetcher};
use llm_search::data_models::OrganicResult;
use llm_search::extractor::{ContentExtractor, ExtractError, TextExtractor};

/// A recorded `fetch_pages` call.
#[derive(Debug, Clone)]
pub struct FetchCall {
    pub urls: Vec<String>,
    pub settle_delay: Duration,
    pub total_budget: Duration,
}

/// Serves canned pages and records every batch it is asked for.
#[derive(Default)]
pub struct FakeFetcher {
    pages: HashMap<String, String>,
    unavailable: bool,
    pub calls: Mutex<Vec<FetchCall>>,
}

impl FakeFetcher {
    pub fn with_pages(pages: &[(&str, &str)]) -> Self {
        Self {
            pages: pages
                .iter()
                .map(|(url, html)| (url.to_string(), html.to_string()))
                .collect(),
            ..Default::default()
        }
    }

    pub fn unavailable() -> Self {
        Self {
            unavailable: true,
            ..Default::default()
        }
    }

    pub fn calls(&self) -> Vec<FetchCall> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl PageFetcher for FakeFetcher {
    async fn fetch_pages(
        &self,
        urls: &[String],
        settle_delay: Duration,
        total_budget: Duration,
    ) -> Result<HashMap<String, String>, FetchError> {
        self.calls.lock().unwrap().push(FetchCall {
            urls: urls.to_vec(),
            settle_delay,
            total_budget,
        });
        if self.unavailable {
            return Err(FetchError::PoolClosed);
        }
        Ok(urls
            .iter()
            .filter_map(|url| self.pages.get(url).map(|html| (url.clone(), html.clone())))
            .collect())
    }
}

/// Behaves like `ContentExtractor` except on pages containing a marker.
pub struct FlakyExtractor;

impl TextExtractor for FlakyExtractor {
    fn extract(&self, html: &str) -> Result<String, ExtractError> {
        if html.contains("BROKEN") {
            return Err(ExtractError::Parse(std::io::Error::other("broken page")));
        }
        if html.contains("PANIC") {
            panic!("extractor blew up");
        }
        ContentExtractor.extract(html)
    }
}

pub fn result(link: &str, title: &str) -> OrganicResult {
    OrganicResult::new(link, title, Some(format!("snippet for {title}")))
}

pub fn page(body: &str) -> String {
    format!(
        "<html><body><nav>Menu</nav><p>{body}</p><footer>Footer text</footer></body></html>"
    )
}
