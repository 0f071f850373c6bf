use dotenvy::dotenv;
use std::env;
use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_SERP_URL: &str = "https://serpapi.com/search";
pub const DEFAULT_SERP_ENGINE: &str = "google_light";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    Missing(&'static str),
    #[error("invalid value {value:?} for {key}")]
    Invalid { key: &'static str, value: String },
}

#[derive(Debug, Clone)]
pub struct Config {
    pub serp_api_key: String,
    pub serp_url: String,
    pub serp_engine: String,
    pub search_timeout: Duration,
    pub crawl_budget: Duration,
    pub crawler: CrawlerConfig,
    pub bind_addr: SocketAddr,
    pub log_level: tracing::Level,
}

/// Settings for the page-fetching pool.
#[derive(Debug, Clone)]
pub struct CrawlerConfig {
    pub max_crawlers: usize,
    pub page_timeout: Duration,
    pub mobile: bool,
    pub proxy: Option<String>,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            max_crawlers: 20,
            page_timeout: Duration::from_secs(60),
            mobile: false,
            proxy: None,
        }
    }
}

impl Config {
    /// Reads the configuration from the environment, loading `.env` first if present.
    pub fn from_env() -> Result<Config, ConfigError> {
        dotenv().ok();
        let crawler_defaults = CrawlerConfig::default();
        Ok(Config {
            serp_api_key: get_env("SERP_API_KEY")?,
            serp_url: get_env_or_default("SERP_URL", DEFAULT_SERP_URL),
            serp_engine: get_env_or_default("SERP_ENGINE", DEFAULT_SERP_ENGINE),
            search_timeout: Duration::from_secs(parse_env_or("SEARCH_TIMEOUT_SECS", 10)?),
            crawl_budget: Duration::from_secs(parse_env_or("CRAWL_BUDGET_SECS", 8)?),
            crawler: CrawlerConfig {
                max_crawlers: parse_env_or("MAX_CRAWLERS", crawler_defaults.max_crawlers)?,
                page_timeout: Duration::from_secs(parse_env_or(
                    "PAGE_TIMEOUT_SECS",
                    crawler_defaults.page_timeout.as_secs(),
                )?),
                mobile: parse_env_or("CRAWLER_MOBILE", crawler_defaults.mobile)?,
                proxy: env::var("CRAWLER_PROXY").ok().filter(|p| !p.is_empty()),
            },
            bind_addr: parse_env_or("BIND_ADDR", SocketAddr::from(([127, 0, 0, 1], 8080)))?,
            log_level: parse_env_or("LOG_LEVEL", tracing::Level::INFO)?,
        })
    }
}

fn get_env(key: &'static str) -> Result<String, ConfigError> {
    env::var(key).map_err(|_| ConfigError::Missing(key))
}

fn get_env_or_default(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn parse_env_or<T: FromStr>(key: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(key) {
        Ok(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { key, value }),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unset_variable_falls_back_to_default() {
        let value: u64 = parse_env_or("LLM_SEARCH_TEST_NEVER_SET", 8).unwrap();
        assert_eq!(value, 8);
        assert_eq!(
            get_env_or_default("LLM_SEARCH_TEST_NEVER_SET", "fallback"),
            "fallback"
        );
    }

    #[test]
    fn test_missing_required_variable_is_an_error() {
        let err = get_env("LLM_SEARCH_TEST_NEVER_SET").unwrap_err();
        assert!(matches!(err, ConfigError::Missing("LLM_SEARCH_TEST_NEVER_SET")));
    }

    #[test]
    fn test_crawler_defaults() {
        let config = CrawlerConfig::default();
        assert_eq!(config.max_crawlers, 20);
        assert_eq!(config.page_timeout, Duration::from_secs(60));
        assert!(!config.mobile);
        assert!(config.proxy.is_none());
    }
}
