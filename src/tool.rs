use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::crawler::PageFetcher;
use crate::data_models::SearchOutput;
use crate::enricher::Enricher;
use crate::search::{SearchClient, SearchError, SearchQuery};

pub const DEFAULT_CRAWL_BUDGET: Duration = Duration::from_secs(8);

/// Arguments of one `llm_search` call.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LlmSearchRequest {
    pub query: String,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub start: Option<u32>,
    /// Also fetch every result page and return its content as markdown.
    #[serde(default)]
    pub crawl: Option<bool>,
}

impl LlmSearchRequest {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            ..Default::default()
        }
    }

    pub fn to_query(&self) -> SearchQuery {
        SearchQuery {
            location: self.location.clone(),
            start: self.start,
            ..SearchQuery::new(self.query.clone())
        }
    }
}

/// Search, optionally crawl the results, return only what callers need.
pub struct LlmSearch {
    client: SearchClient,
    enricher: Enricher,
    crawl_budget: Duration,
}

impl LlmSearch {
    pub fn new(client: SearchClient, fetcher: Arc<dyn PageFetcher>) -> Self {
        Self::with_enricher(client, Enricher::new(fetcher), DEFAULT_CRAWL_BUDGET)
    }

    pub fn with_enricher(client: SearchClient, enricher: Enricher, crawl_budget: Duration) -> Self {
        Self {
            client,
            enricher,
            crawl_budget,
        }
    }

    pub fn from_config(
        config: &Config,
        fetcher: Arc<dyn PageFetcher>,
    ) -> Result<Self, SearchError> {
        let client = SearchClient::from_config(config)?;
        Ok(Self::with_enricher(
            client,
            Enricher::new(fetcher),
            config.crawl_budget,
        ))
    }

    pub async fn llm_search(&self, request: &LlmSearchRequest) -> Result<SearchOutput, SearchError> {
        let mut response = self.client.search(&request.to_query()).await?;
        if request.crawl.unwrap_or(false) {
            self.enricher
                .enrich(&mut response.organic_results, self.crawl_budget)
                .await;
        }
        Ok(response.trim())
    }
}
