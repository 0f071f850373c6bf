use std::time::Duration;

use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::{Config, DEFAULT_SERP_ENGINE, DEFAULT_SERP_URL};
use crate::data_models::SearchResponse;

#[derive(Debug, Error)]
pub enum SearchError {
    #[error("search request timed out")]
    Timeout,
    #[error("search request failed: {0}")]
    Request(#[source] reqwest::Error),
    #[error("search API returned {status}: {body}")]
    Status {
        status: reqwest::StatusCode,
        body: String,
    },
    #[error("could not decode search response: {0}")]
    Decode(#[source] reqwest::Error),
}

impl From<reqwest::Error> for SearchError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            SearchError::Timeout
        } else if e.is_decode() {
            SearchError::Decode(e)
        } else {
            SearchError::Request(e)
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Safe {
    Active,
    Off,
}

impl Safe {
    fn as_str(self) -> &'static str {
        match self {
            Safe::Active => "active",
            Safe::Off => "off",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Device {
    Desktop,
    Tablet,
    Mobile,
}

impl Device {
    fn as_str(self) -> &'static str {
        match self {
            Device::Desktop => "desktop",
            Device::Tablet => "tablet",
            Device::Mobile => "mobile",
        }
    }
}

/// Parameters for one search. `None` means "not specified" and the
/// parameter is left off the request, so the provider applies its own default.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchQuery {
    pub q: String,
    /// Folded into `q`; the light engine has no separate location parameter.
    pub location: Option<String>,
    pub safe: Option<Safe>,
    /// Exclude results from an auto-corrected query.
    pub nfpr: Option<bool>,
    /// "Similar results" / "omitted results" filters.
    pub filter: Option<bool>,
    pub start: Option<u32>,
    pub num: Option<u32>,
    pub device: Option<Device>,
    pub no_cache: Option<bool>,
    #[serde(rename = "async")]
    pub async_search: Option<bool>,
    pub zero_trace: Option<bool>,
}

impl SearchQuery {
    pub fn new(q: impl Into<String>) -> Self {
        SearchQuery {
            q: q.into(),
            ..Default::default()
        }
    }

    pub fn location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    pub fn start(mut self, start: u32) -> Self {
        self.start = Some(start);
        self
    }

    /// Query text as sent on the wire, with the location appended if set.
    pub fn query_text(&self) -> String {
        match self.location.as_deref() {
            Some(location) if !location.is_empty() => {
                format!("{}, location: {}", self.q, location)
            }
            _ => self.q.clone(),
        }
    }

    /// Search parameters, excluding engine and credentials. Only fields the
    /// caller set are present.
    pub fn params(&self) -> Vec<(&'static str, String)> {
        let mut params = vec![("q", self.query_text())];
        if let Some(safe) = self.safe {
            params.push(("safe", safe.as_str().to_string()));
        }
        if let Some(nfpr) = self.nfpr {
            params.push(("nfpr", flag(nfpr)));
        }
        if let Some(filter) = self.filter {
            params.push(("filter", flag(filter)));
        }
        if let Some(start) = self.start {
            params.push(("start", start.to_string()));
        }
        if let Some(num) = self.num {
            params.push(("num", num.to_string()));
        }
        if let Some(device) = self.device {
            params.push(("device", device.as_str().to_string()));
        }
        if let Some(no_cache) = self.no_cache {
            params.push(("no_cache", no_cache.to_string()));
        }
        if let Some(async_search) = self.async_search {
            params.push(("async", async_search.to_string()));
        }
        if let Some(zero_trace) = self.zero_trace {
            params.push(("zero_trace", zero_trace.to_string()));
        }
        params
    }
}

fn flag(value: bool) -> String {
    let flag = if value { "1" } else { "0" };
    flag.to_string()
}

pub struct SearchClient {
    http: Client,
    url: String,
    engine: String,
    api_key: String,
}

impl SearchClient {
    pub fn new(api_key: impl Into<String>, timeout: Duration) -> Result<SearchClient, SearchError> {
        Self::with_endpoint(DEFAULT_SERP_URL, DEFAULT_SERP_ENGINE, api_key, timeout)
    }

    pub fn with_endpoint(
        url: impl Into<String>,
        engine: impl Into<String>,
        api_key: impl Into<String>,
        timeout: Duration,
    ) -> Result<SearchClient, SearchError> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(SearchError::Request)?;
        Ok(SearchClient {
            http,
            url: url.into(),
            engine: engine.into(),
            api_key: api_key.into(),
        })
    }

    pub fn from_config(config: &Config) -> Result<SearchClient, SearchError> {
        Self::with_endpoint(
            &config.serp_url,
            &config.serp_engine,
            &config.serp_api_key,
            config.search_timeout,
        )
    }

    pub async fn search(&self, query: &SearchQuery) -> Result<SearchResponse, SearchError> {
        let mut params = vec![("engine", self.engine.clone())];
        params.extend(query.params());
        log::info!("searching for {:?}", query.query_text());
        params.push(("api_key", self.api_key.clone()));

        let res = self.http.get(&self.url).query(&params).send().await?;
        let status = res.status();
        if !status.is_success() {
            let body = res.text().await.unwrap_or_default();
            return Err(SearchError::Status { status, body });
        }
        let response: SearchResponse = res.json().await?;
        log::info!(
            "search returned {} organic results",
            response.organic_results.len()
        );
        Ok(response)
    }
}
