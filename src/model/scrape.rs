//! Single-page scrapes
//!
//! A scrape status payload is either still pending, a success, or a failure.
//! The success/failure split is decided by the `success` flag when present
//! and by the status otherwise, never by which content fields happen to be
//! set.

use crate::model::content::LazyContent;
use crate::model::{from_payload, JobStatus, ScrapeType};
use crate::transport::ContentFetcher;
use crate::WebCrawlerError;
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;

/// Wire shape of a scrape; everything optional until validated
#[derive(Debug, Deserialize)]
struct RawScrape {
    id: Option<String>,
    status: Option<String>,
    success: Option<bool>,
    scrape_type: Option<String>,
    content: Option<String>,
    html: Option<String>,
    cleaned: Option<String>,
    markdown: Option<String>,
    raw_content_url: Option<String>,
    cleaned_content_url: Option<String>,
    markdown_content_url: Option<String>,
    page_title: Option<String>,
    page_status_code: Option<u16>,
    links: Option<Vec<String>>,
    structured_data: Option<Value>,
    cost: Option<f64>,
    error_code: Option<String>,
    error_message: Option<String>,
    error: Option<String>,
    recommended_pull_delay_ms: Option<u64>,
}

/// Successful scrape of one page
#[derive(Debug, Clone)]
pub struct ScrapeResult {
    pub id: Option<String>,
    pub scrape_type: Option<ScrapeType>,
    pub page_title: Option<String>,
    /// HTTP status the scraper got from the page
    pub page_status_code: Option<u16>,
    pub links: Vec<String>,
    /// Extraction output for a `prompt`/`response_schema`, as returned
    pub structured_data: Option<Value>,
    pub cost: Option<f64>,
    content: LazyContent,
}

impl ScrapeResult {
    /// Returns the page content, fetching it first if the server returned a
    /// locator instead of the body
    pub async fn content(&self) -> Result<&str, WebCrawlerError> {
        self.content.get().await
    }

    pub fn content_url(&self) -> Option<&str> {
        self.content.locator()
    }

    pub fn is_content_loaded(&self) -> bool {
        self.content.is_loaded()
    }
}

/// Failed scrape; carries no content
#[derive(Debug, Clone, PartialEq)]
pub struct ScrapeResultError {
    pub id: Option<String>,
    pub error_code: Option<String>,
    pub error_message: String,
    pub page_status_code: Option<u16>,
}

/// Terminal result of a scrape
#[derive(Debug, Clone)]
pub enum ScrapeOutcome {
    Success(ScrapeResult),
    Error(ScrapeResultError),
}

impl ScrapeOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }

    pub fn into_result(self) -> Result<ScrapeResult, ScrapeResultError> {
        match self {
            Self::Success(result) => Ok(result),
            Self::Error(error) => Err(error),
        }
    }
}

/// Snapshot of a scrape as seen by a status call
#[derive(Debug, Clone)]
pub struct Scrape {
    /// Absent on synchronous responses that never needed one
    pub id: Option<String>,
    pub status: JobStatus,
    pub recommended_pull_delay: Option<Duration>,
    /// Set once the scrape is terminal
    pub outcome: Option<ScrapeOutcome>,
}

impl Scrape {
    /// Returns true once the outcome is known
    pub fn is_terminal(&self) -> bool {
        self.outcome.is_some()
    }

    pub fn into_outcome(self) -> Option<ScrapeOutcome> {
        self.outcome
    }
}

/// Parses a scrape payload, pending or terminal
///
/// # Errors
///
/// * `MalformedResponse` - neither `status` nor `success` present, or a
///   field has the wrong type
/// * `UnknownStatus` - `status` is not a known value
pub fn parse_scrape(value: Value, fetcher: &ContentFetcher) -> Result<Scrape, WebCrawlerError> {
    parse_scrape_payload("scrape", value, None, fetcher)
}

/// Parses the response to `POST /v2/scrape`
///
/// Besides a full status payload the server may answer with only the
/// identifier of a queued scrape; that reads as a pending scrape in the
/// `new` state.
pub fn parse_scrape_submission(
    value: Value,
    fetcher: &ContentFetcher,
) -> Result<Scrape, WebCrawlerError> {
    parse_scrape_payload("scrape submission", value, Some(JobStatus::New), fetcher)
}

fn parse_scrape_payload(
    what: &str,
    value: Value,
    unreported: Option<JobStatus>,
    fetcher: &ContentFetcher,
) -> Result<Scrape, WebCrawlerError> {
    let raw: RawScrape = from_payload(what, value)?;

    let reported = match raw.status.as_deref() {
        Some(s) => Some(JobStatus::parse(s)?),
        None => None,
    };
    let success = raw.success;
    let status = match (reported, success) {
        (Some(status), _) => status,
        (None, Some(true)) => JobStatus::Done,
        (None, Some(false)) => JobStatus::Error,
        (None, None) => match unreported {
            Some(status) => status,
            None => {
                return Err(WebCrawlerError::MalformedResponse(format!(
                    "{} is missing required field 'status'",
                    what
                )))
            }
        },
    };

    let failed = success == Some(false) || matches!(status, JobStatus::Error | JobStatus::Canceled);
    let id = raw.id.clone();
    let recommended_pull_delay = raw
        .recommended_pull_delay_ms
        .filter(|ms| *ms > 0)
        .map(Duration::from_millis);

    let outcome = if failed {
        Some(ScrapeOutcome::Error(build_error(raw, status)))
    } else if status == JobStatus::Done {
        Some(ScrapeOutcome::Success(build_result(raw, fetcher)?))
    } else {
        None
    };

    Ok(Scrape {
        id,
        status,
        recommended_pull_delay,
        outcome,
    })
}

/// Parses a payload that must already be terminal
///
/// A pending payload fails with `MalformedResponse`.
pub fn parse_scrape_result(
    value: Value,
    fetcher: &ContentFetcher,
) -> Result<ScrapeOutcome, WebCrawlerError> {
    let scrape = parse_scrape(value, fetcher)?;
    let status = scrape.status;
    scrape.into_outcome().ok_or_else(|| {
        WebCrawlerError::MalformedResponse(format!("scrape is still {}, no result yet", status))
    })
}

fn build_error(raw: RawScrape, status: JobStatus) -> ScrapeResultError {
    let error_message = raw
        .error_message
        .or(raw.error)
        .filter(|message| !message.is_empty())
        .unwrap_or_else(|| format!("scrape ended with status {}", status));

    ScrapeResultError {
        id: raw.id,
        error_code: raw.error_code,
        error_message,
        page_status_code: raw.page_status_code,
    }
}

fn build_result(raw: RawScrape, fetcher: &ContentFetcher) -> Result<ScrapeResult, WebCrawlerError> {
    let scrape_type = match raw.scrape_type.as_deref() {
        None | Some("") => None,
        Some(s) => Some(ScrapeType::from_api_str(s).ok_or_else(|| {
            WebCrawlerError::MalformedResponse(format!("scrape has unknown scrape_type '{}'", s))
        })?),
    };

    let (inline, locator) = match scrape_type {
        Some(ScrapeType::Html) => (raw.content.or(raw.html), raw.raw_content_url),
        Some(ScrapeType::Cleaned) => (raw.content.or(raw.cleaned), raw.cleaned_content_url),
        Some(ScrapeType::Markdown) => (raw.content.or(raw.markdown), raw.markdown_content_url),
        None => (
            raw.content.or(raw.markdown).or(raw.cleaned).or(raw.html),
            raw.markdown_content_url
                .or(raw.cleaned_content_url)
                .or(raw.raw_content_url),
        ),
    };

    let owner_id = raw.id.clone().unwrap_or_else(|| "scrape".to_string());
    let content = match inline {
        Some(body) => LazyContent::inline(owner_id, body, fetcher.clone()),
        None => LazyContent::deferred(owner_id, locator, fetcher.clone()),
    };

    Ok(ScrapeResult {
        id: raw.id,
        scrape_type,
        page_title: raw.page_title,
        page_status_code: raw.page_status_code,
        links: raw.links.unwrap_or_default(),
        structured_data: raw.structured_data.filter(|data| !data.is_null()),
        cost: raw.cost,
        content,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn parse(value: Value) -> Result<Scrape, WebCrawlerError> {
        parse_scrape(value, &ContentFetcher::default())
    }

    #[test]
    fn test_pending_scrape() {
        let scrape = parse(json!({
            "id": "s1",
            "status": "in_progress",
            "recommended_pull_delay_ms": 1500
        }))
        .unwrap();

        assert_eq!(scrape.id.as_deref(), Some("s1"));
        assert!(!scrape.is_terminal());
        assert_eq!(
            scrape.recommended_pull_delay,
            Some(Duration::from_millis(1500))
        );
    }

    #[tokio::test]
    async fn test_done_scrape_with_inline_content() {
        let scrape = parse(json!({
            "id": "s1",
            "status": "done",
            "success": true,
            "scrape_type": "markdown",
            "markdown": "# Hello",
            "page_title": "Hello",
            "page_status_code": 200,
            "links": ["https://example.com/a"],
            "structured_data": {"title": "Hello"},
            "cost": 0.5
        }))
        .unwrap();

        assert!(scrape.is_terminal());
        let result = match scrape.into_outcome() {
            Some(ScrapeOutcome::Success(result)) => result,
            other => panic!("expected success, got {:?}", other),
        };

        assert_eq!(result.page_title.as_deref(), Some("Hello"));
        assert_eq!(result.links.len(), 1);
        assert_eq!(result.structured_data, Some(json!({"title": "Hello"})));
        assert!(result.is_content_loaded());
        assert_eq!(result.content().await.unwrap(), "# Hello");
    }

    #[test]
    fn test_synchronous_success_without_status() {
        let scrape = parse(json!({"success": true, "content": "<p>x</p>"})).unwrap();
        assert_eq!(scrape.status, JobStatus::Done);
        assert!(scrape.id.is_none());
        assert!(matches!(scrape.outcome, Some(ScrapeOutcome::Success(_))));
    }

    #[test]
    fn test_success_flag_false_wins_over_done() {
        let scrape = parse(json!({
            "id": "s1",
            "status": "done",
            "success": false,
            "error_code": "page_blocked",
            "error_message": "blocked by target",
            "markdown": "ignored"
        }))
        .unwrap();

        match scrape.into_outcome() {
            Some(ScrapeOutcome::Error(error)) => {
                assert_eq!(error.error_message, "blocked by target");
                assert_eq!(error.error_code.as_deref(), Some("page_blocked"));
            }
            other => panic!("expected error outcome, got {:?}", other),
        }
    }

    #[test]
    fn test_error_status_without_message() {
        let outcome =
            parse_scrape_result(json!({"id": "s1", "status": "error"}), &ContentFetcher::default())
                .unwrap();

        match outcome {
            ScrapeOutcome::Error(error) => {
                assert_eq!(error.error_message, "scrape ended with status error")
            }
            ScrapeOutcome::Success(_) => panic!("expected error outcome"),
        }
    }

    #[test]
    fn test_parse_scrape_result_rejects_pending() {
        let result =
            parse_scrape_result(json!({"id": "s1", "status": "new"}), &ContentFetcher::default());
        assert!(matches!(result, Err(WebCrawlerError::MalformedResponse(_))));
    }

    #[test]
    fn test_missing_status_and_success() {
        let result = parse(json!({"id": "s1"}));
        assert!(matches!(result, Err(WebCrawlerError::MalformedResponse(_))));
    }

    #[test]
    fn test_unknown_status() {
        let result = parse(json!({"id": "s1", "status": "queued"}));
        assert!(matches!(result, Err(WebCrawlerError::UnknownStatus(_))));
    }

    #[test]
    fn test_submission_with_only_an_id_is_pending() {
        let scrape =
            parse_scrape_submission(json!({"id": "s1"}), &ContentFetcher::default()).unwrap();

        assert_eq!(scrape.id.as_deref(), Some("s1"));
        assert_eq!(scrape.status, JobStatus::New);
        assert!(!scrape.is_terminal());
    }

    #[test]
    fn test_submission_with_inline_result() {
        let scrape = parse_scrape_submission(
            json!({"success": true, "markdown": "# Hi"}),
            &ContentFetcher::default(),
        )
        .unwrap();
        assert!(matches!(scrape.outcome, Some(ScrapeOutcome::Success(_))));
    }

    #[test]
    fn test_status_payload_still_requires_status() {
        let result = parse(json!({"id": "s1"}));
        assert!(
            matches!(result, Err(WebCrawlerError::MalformedResponse(m)) if m.contains("'status'"))
        );
    }

    #[tokio::test]
    async fn test_done_without_content_is_not_ready() {
        let outcome = parse_scrape_result(
            json!({"id": "s1", "status": "done"}),
            &ContentFetcher::default(),
        )
        .unwrap();

        let result = outcome.into_result().unwrap();
        assert!(matches!(
            result.content().await,
            Err(WebCrawlerError::ContentNotReady { .. })
        ));
    }
}
