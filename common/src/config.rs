//! Pipeline configuration.
//!
//! Built once (usually from a JSON file) and passed by reference into the
//! pipeline, nothing in here is mutated while a crawl is running.

use std::{
    collections::{BTreeMap, BTreeSet},
    time::Duration,
};

use serde::{Deserialize, Serialize};
use serde_with::{DurationMilliSeconds, serde_as};

pub const LISTING_SELECTOR: &str = "listing";
pub const TITLE_SELECTOR: &str = "title";
pub const PRICE_SELECTOR: &str = "price";
pub const AREA_SELECTOR: &str = "area";
pub const LINK_SELECTOR: &str = "link";

pub const REQUIRED_SELECTORS: [&str; 5] = [
    LISTING_SELECTOR,
    TITLE_SELECTOR,
    PRICE_SELECTOR,
    AREA_SELECTOR,
    LINK_SELECTOR,
];

pub const PAGE_PLACEHOLDER: &str = "{page}";

const DEFAULT_START_PAGE: u64 = 1;
const DEFAULT_CONCURRENCY: usize = 1;
const DEFAULT_RETRY_BUDGET: u32 = 2;
const DEFAULT_FETCH_TIMEOUT_MS: u64 = 30_000;
const DEFAULT_RETRY_BACKOFF_MS: u64 = 500;

/// Logical field name -> selector expression.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(transparent)]
pub struct SelectorMap(BTreeMap<String, String>);

impl SelectorMap {
    pub fn new() -> Self {
        Self(BTreeMap::new())
    }

    pub fn with(mut self, field: impl Into<String>, selector: impl Into<String>) -> Self {
        self.0.insert(field.into(), selector.into());
        self
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.0.get(field).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Required keys that are absent or blank.
    pub fn missing_required(&self) -> Vec<&'static str> {
        REQUIRED_SELECTORS
            .into_iter()
            .filter(|key| self.get(key).is_none_or(|selector| selector.trim().is_empty()))
            .collect()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct FilterCriteria {
    #[serde(default)]
    pub min_price: Option<f64>,
    #[serde(default)]
    pub max_price: Option<f64>,
    #[serde(default)]
    pub min_area: Option<f64>,
    #[serde(default)]
    pub max_area: Option<f64>,
    #[serde(default)]
    pub require_fields: BTreeSet<String>,
}

impl FilterCriteria {
    pub fn has_price_bounds(&self) -> bool {
        self.min_price.is_some() || self.max_price.is_some()
    }

    pub fn has_area_bounds(&self) -> bool {
        self.min_area.is_some() || self.max_area.is_some()
    }

    pub fn with_price_range(mut self, min: Option<f64>, max: Option<f64>) -> Self {
        self.min_price = min;
        self.max_price = max;
        self
    }

    pub fn with_area_range(mut self, min: Option<f64>, max: Option<f64>) -> Self {
        self.min_area = min;
        self.max_area = max;
        self
    }

    pub fn require(mut self, field: impl Into<String>) -> Self {
        self.require_fields.insert(field.into());
        self
    }
}

#[serde_as]
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct PipelineConfig {
    /// May contain `{page}`, without it the listing is a single page.
    pub base_url: String,
    pub selectors: SelectorMap,
    #[serde(default)]
    pub filters: FilterCriteria,
    #[serde(default = "default_start_page")]
    pub start_page: u64,
    #[serde(default)]
    pub max_pages: Option<u64>,
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
    #[serde(default = "default_retry_budget")]
    pub per_page_retry_budget: u32,
    #[serde_as(as = "DurationMilliSeconds<u64>")]
    #[serde(default = "default_fetch_timeout", rename = "perFetchTimeoutMs")]
    pub per_fetch_timeout: Duration,
    #[serde_as(as = "DurationMilliSeconds<u64>")]
    #[serde(default = "default_retry_backoff", rename = "retryBackoffMs")]
    pub retry_backoff: Duration,
    #[serde(default)]
    pub skip_failed_pages: bool,
    #[serde(default = "default_decimal_separator")]
    pub decimal_separator: char,
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
    #[serde(default)]
    pub user_agent: Option<String>,
}

fn default_start_page() -> u64 {
    DEFAULT_START_PAGE
}

fn default_concurrency() -> usize {
    DEFAULT_CONCURRENCY
}

fn default_retry_budget() -> u32 {
    DEFAULT_RETRY_BUDGET
}

fn default_fetch_timeout() -> Duration {
    Duration::from_millis(DEFAULT_FETCH_TIMEOUT_MS)
}

fn default_retry_backoff() -> Duration {
    Duration::from_millis(DEFAULT_RETRY_BACKOFF_MS)
}

fn default_decimal_separator() -> char {
    '.'
}

impl PipelineConfig {
    pub fn new(base_url: impl Into<String>, selectors: SelectorMap) -> Self {
        Self {
            base_url: base_url.into(),
            selectors,
            filters: FilterCriteria::default(),
            start_page: default_start_page(),
            max_pages: None,
            concurrency: default_concurrency(),
            per_page_retry_budget: default_retry_budget(),
            per_fetch_timeout: default_fetch_timeout(),
            retry_backoff: default_retry_backoff(),
            skip_failed_pages: false,
            decimal_separator: default_decimal_separator(),
            headers: BTreeMap::new(),
            user_agent: None,
        }
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn with_filters(mut self, filters: FilterCriteria) -> Self {
        self.filters = filters;
        self
    }

    pub fn with_max_pages(mut self, max_pages: u64) -> Self {
        self.max_pages = Some(max_pages);
        self
    }

    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency;
        self
    }

    pub fn with_retry_budget(mut self, budget: u32) -> Self {
        self.per_page_retry_budget = budget;
        self
    }

    pub fn with_retry_backoff(mut self, backoff: Duration) -> Self {
        self.retry_backoff = backoff;
        self
    }

    pub fn with_fetch_timeout(mut self, timeout: Duration) -> Self {
        self.per_fetch_timeout = timeout;
        self
    }

    pub fn with_skip_failed_pages(mut self, skip: bool) -> Self {
        self.skip_failed_pages = skip;
        self
    }

    pub fn is_paginated(&self) -> bool {
        self.base_url.contains(PAGE_PLACEHOLDER)
    }

    pub fn page_url(&self, page_num: u64) -> String {
        self.base_url.replace(PAGE_PLACEHOLDER, &page_num.to_string())
    }

    /// Last page to fetch (inclusive), `None` means "until an empty page".
    pub fn last_page(&self) -> Option<u64> {
        if !self.is_paginated() {
            return Some(self.start_page);
        }

        self.max_pages
            .map(|max_pages| self.start_page + max_pages.saturating_sub(1))
    }

    pub fn header_pairs(&self) -> Vec<(String, String)> {
        self.headers
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CONFIG: &str = r#"{
        "baseUrl": "https://example.com/listings?page={page}",
        "selectors": {
            "listing": ".listing-item",
            "title": ".listing-title",
            "price": ".listing-price",
            "area": ".listing-area",
            "link": "a.listing-link",
            "rooms": ".listing-rooms"
        },
        "filters": { "minPrice": 0, "maxPrice": 500000, "minArea": 50 },
        "maxPages": 5,
        "perFetchTimeoutMs": 10000
    }"#;

    #[test]
    fn parses_config_with_defaults() {
        let config = PipelineConfig::from_json(CONFIG).unwrap();

        assert_eq!(config.start_page, 1);
        assert_eq!(config.concurrency, 1);
        assert_eq!(config.per_page_retry_budget, 2);
        assert_eq!(config.per_fetch_timeout, Duration::from_secs(10));
        assert_eq!(config.retry_backoff, Duration::from_millis(500));
        assert_eq!(config.decimal_separator, '.');
        assert_eq!(config.filters.max_price, Some(500000.0));
        assert_eq!(config.filters.max_area, None);
        assert_eq!(config.selectors.get("rooms"), Some(".listing-rooms"));
        assert!(config.selectors.missing_required().is_empty());
    }

    #[test]
    fn rejects_unknown_keys() {
        let json = r#"{ "baseUrl": "https://a", "selectors": {}, "maxPage": 3 }"#;

        assert!(PipelineConfig::from_json(json).is_err());
    }

    #[test]
    fn reports_missing_and_blank_selectors() {
        let selectors = SelectorMap::new()
            .with("listing", ".item")
            .with("title", "  ")
            .with("price", ".price");

        assert_eq!(selectors.missing_required(), vec!["title", "area", "link"]);
    }

    #[test]
    fn page_range_follows_template() {
        let config = PipelineConfig::from_json(CONFIG).unwrap();
        assert_eq!(config.page_url(3), "https://example.com/listings?page=3");
        assert_eq!(config.last_page(), Some(5));

        let single = PipelineConfig::new("https://example.com/listings", SelectorMap::new())
            .with_max_pages(10);
        assert!(!single.is_paginated());
        assert_eq!(single.last_page(), Some(1));

        let open_ended = PipelineConfig::new("https://example.com/p/{page}", SelectorMap::new());
        assert_eq!(open_ended.last_page(), None);
    }
}
