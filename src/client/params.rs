//! Per-call request parameters

use crate::model::{Action, ScrapeType};
use crate::WebCrawlerError;
use serde::Serialize;
use serde_json::Value;
use std::time::Duration;
use url::Url;

/// Pages crawled when the caller sets no limit
pub const DEFAULT_ITEMS_LIMIT: u32 = 10;

/// Options for starting a crawl
///
/// # Example
///
/// ```
/// use webcrawlerapi::{CrawlParams, ScrapeType};
///
/// let params = CrawlParams::new("https://example.com")
///     .scrape_type(ScrapeType::Markdown)
///     .items_limit(25)
///     .max_polls(50);
/// assert_eq!(params.items_limit, 25);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct CrawlParams {
    /// Seed URL where the crawl starts
    pub url: String,
    pub scrape_type: ScrapeType,
    /// Maximum number of pages to crawl
    pub items_limit: u32,
    /// Receives a POST when the job finishes
    pub webhook_url: Option<String>,
    pub allow_subdomains: bool,
    /// Only follow URLs matching this pattern
    pub whitelist_regexp: Option<String>,
    /// Never follow URLs matching this pattern
    pub blacklist_regexp: Option<String>,
    pub main_content_only: Option<bool>,
    pub actions: Vec<Action>,
    /// Status checks before `crawl` gives up; client default when unset
    pub max_polls: Option<u32>,
    /// Replaces the client's default delay between status checks
    pub poll_interval_override: Option<Duration>,
}

#[derive(Serialize)]
struct CrawlRequest<'a> {
    url: &'a str,
    scrape_type: ScrapeType,
    items_limit: u32,
    allow_subdomains: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    webhook_url: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    whitelist_regexp: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    blacklist_regexp: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    main_content_only: Option<bool>,
    #[serde(skip_serializing_if = "<[Action]>::is_empty")]
    actions: &'a [Action],
}

impl CrawlParams {
    /// Creates crawl options with the service defaults: `html` output,
    /// 10 pages, no subdomains
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            scrape_type: ScrapeType::default(),
            items_limit: DEFAULT_ITEMS_LIMIT,
            webhook_url: None,
            allow_subdomains: false,
            whitelist_regexp: None,
            blacklist_regexp: None,
            main_content_only: None,
            actions: Vec::new(),
            max_polls: None,
            poll_interval_override: None,
        }
    }

    pub fn scrape_type(mut self, scrape_type: ScrapeType) -> Self {
        self.scrape_type = scrape_type;
        self
    }

    pub fn items_limit(mut self, items_limit: u32) -> Self {
        self.items_limit = items_limit;
        self
    }

    pub fn webhook_url(mut self, webhook_url: impl Into<String>) -> Self {
        self.webhook_url = Some(webhook_url.into());
        self
    }

    pub fn allow_subdomains(mut self, allow: bool) -> Self {
        self.allow_subdomains = allow;
        self
    }

    pub fn whitelist_regexp(mut self, pattern: impl Into<String>) -> Self {
        self.whitelist_regexp = Some(pattern.into());
        self
    }

    pub fn blacklist_regexp(mut self, pattern: impl Into<String>) -> Self {
        self.blacklist_regexp = Some(pattern.into());
        self
    }

    pub fn main_content_only(mut self, enabled: bool) -> Self {
        self.main_content_only = Some(enabled);
        self
    }

    pub fn action(mut self, action: Action) -> Self {
        self.actions.push(action);
        self
    }

    pub fn max_polls(mut self, max_polls: u32) -> Self {
        self.max_polls = Some(max_polls);
        self
    }

    pub fn poll_interval_override(mut self, interval: Duration) -> Self {
        self.poll_interval_override = Some(interval);
        self
    }

    /// Validates the options and renders the submission body
    pub(crate) fn to_body(&self) -> Result<Value, WebCrawlerError> {
        let url = validate_target_url(&self.url)?;

        if self.items_limit < 1 {
            return Err(WebCrawlerError::InvalidRequest(
                "items_limit must be >= 1".to_string(),
            ));
        }
        validate_max_polls(self.max_polls)?;

        let request = CrawlRequest {
            url,
            scrape_type: self.scrape_type,
            items_limit: self.items_limit,
            allow_subdomains: self.allow_subdomains,
            webhook_url: non_empty(&self.webhook_url),
            whitelist_regexp: non_empty(&self.whitelist_regexp),
            blacklist_regexp: non_empty(&self.blacklist_regexp),
            main_content_only: self.main_content_only,
            actions: &self.actions,
        };

        to_value(&request)
    }
}

/// Options for scraping a single page
#[derive(Debug, Clone, PartialEq)]
pub struct ScrapeParams {
    pub url: String,
    /// Output format; the server default applies when unset
    pub scrape_type: Option<ScrapeType>,
    /// Extraction instruction for structured output
    pub prompt: Option<String>,
    /// JSON schema for structured output, sent verbatim
    pub response_schema: Option<Value>,
    pub main_content_only: Option<bool>,
    pub actions: Vec<Action>,
    pub webhook_url: Option<String>,
    pub max_polls: Option<u32>,
    pub poll_interval_override: Option<Duration>,
}

#[derive(Serialize)]
struct ScrapeRequest<'a> {
    url: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    scrape_type: Option<ScrapeType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    prompt: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_schema: Option<&'a Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    main_content_only: Option<bool>,
    #[serde(skip_serializing_if = "<[Action]>::is_empty")]
    actions: &'a [Action],
    #[serde(skip_serializing_if = "Option::is_none")]
    webhook_url: Option<&'a str>,
}

impl ScrapeParams {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            scrape_type: None,
            prompt: None,
            response_schema: None,
            main_content_only: None,
            actions: Vec::new(),
            webhook_url: None,
            max_polls: None,
            poll_interval_override: None,
        }
    }

    pub fn scrape_type(mut self, scrape_type: ScrapeType) -> Self {
        self.scrape_type = Some(scrape_type);
        self
    }

    pub fn prompt(mut self, prompt: impl Into<String>) -> Self {
        self.prompt = Some(prompt.into());
        self
    }

    pub fn response_schema(mut self, schema: Value) -> Self {
        self.response_schema = Some(schema);
        self
    }

    pub fn main_content_only(mut self, enabled: bool) -> Self {
        self.main_content_only = Some(enabled);
        self
    }

    pub fn action(mut self, action: Action) -> Self {
        self.actions.push(action);
        self
    }

    pub fn webhook_url(mut self, webhook_url: impl Into<String>) -> Self {
        self.webhook_url = Some(webhook_url.into());
        self
    }

    pub fn max_polls(mut self, max_polls: u32) -> Self {
        self.max_polls = Some(max_polls);
        self
    }

    pub fn poll_interval_override(mut self, interval: Duration) -> Self {
        self.poll_interval_override = Some(interval);
        self
    }

    pub(crate) fn to_body(&self) -> Result<Value, WebCrawlerError> {
        let url = validate_target_url(&self.url)?;
        validate_max_polls(self.max_polls)?;

        let request = ScrapeRequest {
            url,
            scrape_type: self.scrape_type,
            prompt: non_empty(&self.prompt),
            response_schema: self.response_schema.as_ref(),
            main_content_only: self.main_content_only,
            actions: &self.actions,
            webhook_url: non_empty(&self.webhook_url),
        };

        to_value(&request)
    }
}

fn validate_target_url(raw: &str) -> Result<&str, WebCrawlerError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(WebCrawlerError::InvalidRequest("url is required".to_string()));
    }

    let url = Url::parse(trimmed)
        .map_err(|e| WebCrawlerError::InvalidRequest(format!("invalid url '{}': {}", trimmed, e)))?;
    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(WebCrawlerError::InvalidRequest(format!(
            "url '{}' must use http or https",
            trimmed
        )));
    }

    Ok(trimmed)
}

fn validate_max_polls(max_polls: Option<u32>) -> Result<(), WebCrawlerError> {
    if max_polls == Some(0) {
        return Err(WebCrawlerError::InvalidRequest(
            "max_polls must be >= 1".to_string(),
        ));
    }
    Ok(())
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|s| !s.is_empty())
}

fn to_value<T: Serialize>(request: &T) -> Result<Value, WebCrawlerError> {
    serde_json::to_value(request)
        .map_err(|e| WebCrawlerError::InvalidRequest(format!("cannot encode request: {}", e)))
}
