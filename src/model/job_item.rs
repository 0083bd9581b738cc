//! One crawled page inside a job

use crate::model::content::LazyContent;
use crate::model::{from_payload, required, JobStatus, ScrapeType};
use crate::timestamp::parse_timestamp;
use crate::transport::ContentFetcher;
use crate::WebCrawlerError;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::Value;

/// Wire shape of a job item; everything optional until validated
#[derive(Debug, Deserialize)]
pub(crate) struct RawJobItem {
    id: Option<String>,
    job_id: Option<String>,
    original_url: Option<String>,
    #[serde(alias = "referrer_url")]
    referred_url: Option<String>,
    page_status_code: Option<u16>,
    status: Option<String>,
    title: Option<String>,
    cost: Option<f64>,
    last_error: Option<String>,
    created_at: Option<String>,
    raw_content_url: Option<String>,
    cleaned_content_url: Option<String>,
    markdown_content_url: Option<String>,
}

/// A page crawled as part of a job
///
/// Only the locator for the job's scrape type is expected to be set. The
/// page body itself is fetched on the first call to [`JobItem::content`].
#[derive(Debug, Clone)]
pub struct JobItem {
    pub id: String,
    pub job_id: Option<String>,
    pub original_url: Option<String>,
    /// Page that linked here, absent for the seed URL
    pub referred_url: Option<String>,
    /// HTTP status the crawler got when fetching the page
    pub page_status_code: Option<u16>,
    pub status: JobStatus,
    pub title: Option<String>,
    pub cost: Option<f64>,
    pub last_error: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
    pub raw_content_url: Option<String>,
    pub cleaned_content_url: Option<String>,
    pub markdown_content_url: Option<String>,
    content: LazyContent,
}

/// Parses a single job item payload
///
/// `scrape_type` is the parent job's requested output; it selects which
/// locator backs [`JobItem::content`]. Without it the first populated
/// locator is used.
pub fn parse_job_item(
    value: Value,
    scrape_type: Option<ScrapeType>,
    fetcher: &ContentFetcher,
) -> Result<JobItem, WebCrawlerError> {
    let raw: RawJobItem = from_payload("job item", value)?;
    JobItem::from_raw(raw, scrape_type, fetcher)
}

impl JobItem {
    pub(crate) fn from_raw(
        raw: RawJobItem,
        scrape_type: Option<ScrapeType>,
        fetcher: &ContentFetcher,
    ) -> Result<Self, WebCrawlerError> {
        let id = required("job item", "id", raw.id)?;
        let status = JobStatus::parse(&required("job item", "status", raw.status)?)?;
        let created_at = parse_timestamp(raw.created_at.as_deref())?;

        let locator = match scrape_type {
            Some(ScrapeType::Html) => raw.raw_content_url.clone(),
            Some(ScrapeType::Cleaned) => raw.cleaned_content_url.clone(),
            Some(ScrapeType::Markdown) => raw.markdown_content_url.clone(),
            None => raw
                .markdown_content_url
                .clone()
                .or_else(|| raw.cleaned_content_url.clone())
                .or_else(|| raw.raw_content_url.clone()),
        };

        Ok(Self {
            content: LazyContent::deferred(id.clone(), locator, fetcher.clone()),
            id,
            job_id: raw.job_id,
            original_url: raw.original_url,
            referred_url: raw.referred_url,
            page_status_code: raw.page_status_code,
            status,
            title: raw.title,
            cost: raw.cost,
            last_error: raw.last_error,
            created_at,
            raw_content_url: raw.raw_content_url,
            cleaned_content_url: raw.cleaned_content_url,
            markdown_content_url: raw.markdown_content_url,
        })
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    /// Locator backing [`JobItem::content`], if the server has published one
    pub fn content_url(&self) -> Option<&str> {
        self.content.locator()
    }

    /// Returns true once the content has been fetched and cached
    pub fn is_content_loaded(&self) -> bool {
        self.content.is_loaded()
    }

    /// Returns the page content, fetching it on first access
    ///
    /// Fails with `ContentNotReady` while no locator is set, and with `Fetch`
    /// if the locator GET fails.
    pub async fn content(&self) -> Result<&str, WebCrawlerError> {
        self.content.get().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn parse(value: Value, scrape_type: Option<ScrapeType>) -> Result<JobItem, WebCrawlerError> {
        parse_job_item(value, scrape_type, &ContentFetcher::default())
    }

    #[test]
    fn test_parse_full_item() {
        let item = parse(
            json!({
                "id": "i1",
                "job_id": "job_1",
                "original_url": "https://example.com/about",
                "referred_url": "https://example.com/",
                "page_status_code": 200,
                "status": "done",
                "title": "About",
                "cost": 2,
                "created_at": "2024-05-01T10:00:00Z",
                "markdown_content_url": "https://cdn.example.com/i1.md",
                "something_new": {"nested": true}
            }),
            Some(ScrapeType::Markdown),
        )
        .unwrap();

        assert_eq!(item.id, "i1");
        assert_eq!(item.job_id.as_deref(), Some("job_1"));
        assert_eq!(item.page_status_code, Some(200));
        assert_eq!(item.status, JobStatus::Done);
        assert_eq!(item.cost, Some(2.0));
        assert!(item.created_at.is_some());
        assert_eq!(item.content_url(), Some("https://cdn.example.com/i1.md"));
        assert!(item.is_terminal());
    }

    #[test]
    fn test_optional_fields_stay_absent() {
        let item = parse(json!({"id": "i1", "status": "new"}), None).unwrap();

        assert!(item.referred_url.is_none());
        assert!(item.title.is_none());
        assert!(item.cost.is_none());
        assert!(item.created_at.is_none());
        assert!(item.content_url().is_none());
        assert!(!item.is_terminal());
    }

    #[test]
    fn test_locator_follows_scrape_type() {
        let payload = json!({
            "id": "i1",
            "status": "done",
            "raw_content_url": "https://cdn/raw",
            "cleaned_content_url": "https://cdn/cleaned"
        });

        let item = parse(payload.clone(), Some(ScrapeType::Cleaned)).unwrap();
        assert_eq!(item.content_url(), Some("https://cdn/cleaned"));

        let item = parse(payload.clone(), Some(ScrapeType::Html)).unwrap();
        assert_eq!(item.content_url(), Some("https://cdn/raw"));

        let item = parse(payload, Some(ScrapeType::Markdown)).unwrap();
        assert!(item.content_url().is_none());
    }

    #[test]
    fn test_missing_required_fields() {
        let result = parse(json!({"status": "done"}), None);
        assert!(matches!(result, Err(WebCrawlerError::MalformedResponse(m)) if m.contains("'id'")));

        let result = parse(json!({"id": "i1"}), None);
        assert!(
            matches!(result, Err(WebCrawlerError::MalformedResponse(m)) if m.contains("'status'"))
        );
    }

    #[test]
    fn test_unknown_status() {
        let result = parse(json!({"id": "i1", "status": "exploded"}), None);
        assert!(matches!(result, Err(WebCrawlerError::UnknownStatus(s)) if s == "exploded"));
    }

    #[test]
    fn test_wrong_field_type_is_malformed() {
        let result = parse(json!({"id": "i1", "status": "done", "page_status_code": "200"}), None);
        assert!(matches!(result, Err(WebCrawlerError::MalformedResponse(_))));
    }

    #[tokio::test]
    async fn test_content_not_ready_without_locator() {
        let item = parse(json!({"id": "i1", "status": "in_progress"}), None).unwrap();
        assert!(matches!(
            item.content().await,
            Err(WebCrawlerError::ContentNotReady { item_id }) if item_id == "i1"
        ));
    }
}
