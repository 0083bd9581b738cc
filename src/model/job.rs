//! Crawl jobs

use crate::model::job_item::{JobItem, RawJobItem};
use crate::model::{from_payload, required, JobStatus, ScrapeType};
use crate::timestamp::parse_timestamp;
use crate::transport::ContentFetcher;
use crate::WebCrawlerError;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;

/// Wire shape of a job; everything optional until validated
#[derive(Debug, Deserialize)]
struct RawJob {
    id: Option<String>,
    /// Submission responses name the identifier `job_id`
    job_id: Option<String>,
    org_id: Option<String>,
    url: Option<String>,
    status: Option<String>,
    scrape_type: Option<String>,
    items_limit: Option<u32>,
    allow_subdomains: Option<bool>,
    whitelist_regexp: Option<String>,
    blacklist_regexp: Option<String>,
    webhook_url: Option<String>,
    webhook_status: Option<String>,
    webhook_error: Option<String>,
    created_at: Option<String>,
    updated_at: Option<String>,
    finished_at: Option<String>,
    recommended_pull_delay_ms: Option<u64>,
    job_items: Option<Vec<RawJobItem>>,
}

/// A multi-page crawl tracked by the service
///
/// A `Job` is a snapshot: it is never updated in place. Fetch the job again
/// to observe progress.
#[derive(Debug, Clone)]
pub struct Job {
    pub id: String,
    pub org_id: Option<String>,
    /// Seed URL
    pub url: Option<String>,
    pub status: JobStatus,
    pub scrape_type: Option<ScrapeType>,
    pub items_limit: Option<u32>,
    pub allow_subdomains: Option<bool>,
    pub whitelist_regexp: Option<String>,
    pub blacklist_regexp: Option<String>,
    pub webhook_url: Option<String>,
    /// Delivery status of the completion webhook, as reported by the server
    pub webhook_status: Option<String>,
    pub webhook_error: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
    /// Server hint for how long to wait before the next status check
    pub recommended_pull_delay: Option<Duration>,
    pub job_items: Vec<JobItem>,
}

/// Parses a job payload, including its items
///
/// # Errors
///
/// * `MalformedResponse` - `id`/`job_id` or `status` missing, a field has the
///   wrong type, or a timestamp is unreadable
/// * `UnknownStatus` - the job or one of its items reports an unknown status
pub fn parse_job(value: Value, fetcher: &ContentFetcher) -> Result<Job, WebCrawlerError> {
    let raw: RawJob = from_payload("job", value)?;
    let status = JobStatus::parse(required("job", "status", raw.status.as_deref())?)?;
    build_job(raw, status, fetcher)
}

/// Parses the acknowledgement returned by `POST /v1/crawl`
///
/// The acknowledgement may carry nothing but the identifier; a missing
/// `status` then means the job is `new`. A status that is present must
/// still be a known one.
pub fn parse_job_submission(
    value: Value,
    fetcher: &ContentFetcher,
) -> Result<Job, WebCrawlerError> {
    let raw: RawJob = from_payload("job submission", value)?;
    let status = match raw.status.as_deref() {
        Some(s) => JobStatus::parse(s)?,
        None => JobStatus::New,
    };
    build_job(raw, status, fetcher)
}

fn build_job(
    raw: RawJob,
    status: JobStatus,
    fetcher: &ContentFetcher,
) -> Result<Job, WebCrawlerError> {
    let id = required("job", "id", raw.id.or(raw.job_id))?;

    let scrape_type = match raw.scrape_type.as_deref() {
        None | Some("") => None,
        Some(s) => Some(ScrapeType::from_api_str(s).ok_or_else(|| {
            WebCrawlerError::MalformedResponse(format!("job {} has unknown scrape_type '{}'", id, s))
        })?),
    };

    let job_items = raw
        .job_items
        .unwrap_or_default()
        .into_iter()
        .map(|item| JobItem::from_raw(item, scrape_type, fetcher))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Job {
        id,
        org_id: raw.org_id,
        url: raw.url,
        status,
        scrape_type,
        items_limit: raw.items_limit,
        allow_subdomains: raw.allow_subdomains,
        whitelist_regexp: raw.whitelist_regexp,
        blacklist_regexp: raw.blacklist_regexp,
        webhook_url: raw.webhook_url,
        webhook_status: raw.webhook_status,
        webhook_error: raw.webhook_error,
        created_at: parse_timestamp(raw.created_at.as_deref())?,
        updated_at: parse_timestamp(raw.updated_at.as_deref())?,
        finished_at: parse_timestamp(raw.finished_at.as_deref())?,
        recommended_pull_delay: raw
            .recommended_pull_delay_ms
            .filter(|ms| *ms > 0)
            .map(Duration::from_millis),
        job_items,
    })
}

impl Job {
    /// Returns true once the job is done, failed, or canceled
    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    /// Items currently in the given status
    pub fn items_by_status(&self, status: JobStatus) -> impl Iterator<Item = &JobItem> {
        self.job_items
            .iter()
            .filter(move |item| item.status == status)
    }

    /// Items that finished successfully
    pub fn done_items(&self) -> impl Iterator<Item = &JobItem> {
        self.items_by_status(JobStatus::Done)
    }

    pub fn find_item(&self, item_id: &str) -> Option<&JobItem> {
        self.job_items.iter().find(|item| item.id == item_id)
    }

    /// Sum of the per-item costs reported so far
    pub fn total_cost(&self) -> f64 {
        self.job_items.iter().filter_map(|item| item.cost).sum()
    }
}

/// Server acknowledgement of a cancel request
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct CancelConfirmation {
    #[serde(default)]
    pub message: Option<String>,
}

impl CancelConfirmation {
    /// Reads the acknowledgement body
    ///
    /// A JSON object must have a string `message` if it has one at all. A
    /// plain-text body becomes the message; an empty body confirms without
    /// one.
    pub(crate) fn from_value(value: Value) -> Result<Self, WebCrawlerError> {
        match value {
            Value::Object(_) => from_payload("cancel confirmation", value),
            Value::String(message) if message.is_empty() => Ok(Self::default()),
            Value::String(message) => Ok(Self {
                message: Some(message),
            }),
            _ => Ok(Self::default()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn parse(value: Value) -> Result<Job, WebCrawlerError> {
        parse_job(value, &ContentFetcher::default())
    }

    #[test]
    fn test_parse_submission_ack() {
        let job = parse(json!({"id": "job_1", "status": "new"})).unwrap();
        assert_eq!(job.id, "job_1");
        assert_eq!(job.status, JobStatus::New);
        assert!(job.job_items.is_empty());
        assert!(!job.is_terminal());
        assert!(job.created_at.is_none());
        assert!(job.finished_at.is_none());
    }

    #[test]
    fn test_job_id_alias() {
        let job = parse(json!({"job_id": "job_2", "status": "new"})).unwrap();
        assert_eq!(job.id, "job_2");
    }

    #[test]
    fn test_parse_full_job() {
        let job = parse(json!({
            "id": "job_1",
            "org_id": "org_9",
            "url": "https://example.com",
            "status": "done",
            "scrape_type": "markdown",
            "items_limit": 10,
            "allow_subdomains": false,
            "webhook_url": "https://hooks.example.com/done",
            "webhook_status": "sent",
            "created_at": "2024-05-01T10:00:00.123Z",
            "finished_at": "2024-05-01 10:05:00",
            "recommended_pull_delay_ms": 2500,
            "job_items": [
                {"id": "i1", "status": "done", "cost": 1, "markdown_content_url": "https://x/i1.md"},
                {"id": "i2", "status": "error", "last_error": "timeout"},
                {"id": "i3", "status": "done", "cost": 2, "markdown_content_url": "https://x/i3.md"}
            ]
        }))
        .unwrap();

        assert!(job.is_terminal());
        assert_eq!(job.scrape_type, Some(ScrapeType::Markdown));
        assert_eq!(job.webhook_status.as_deref(), Some("sent"));
        assert_eq!(job.recommended_pull_delay, Some(Duration::from_millis(2500)));
        assert_eq!(job.job_items.len(), 3);
        assert_eq!(job.done_items().count(), 2);
        assert_eq!(job.items_by_status(JobStatus::Error).count(), 1);
        assert_eq!(job.total_cost(), 3.0);
        assert_eq!(
            job.find_item("i3").and_then(|i| i.content_url()),
            Some("https://x/i3.md")
        );
        assert!(job.finished_at.unwrap() > job.created_at.unwrap());
    }

    #[test]
    fn test_terminal_predicate_tracks_status() {
        for (status, terminal) in [
            ("new", false),
            ("in_progress", false),
            ("scraping", false),
            ("done", true),
            ("error", true),
            ("canceled", true),
        ] {
            let job = parse(json!({"id": "j", "status": status})).unwrap();
            assert_eq!(job.is_terminal(), terminal, "status {}", status);
        }
    }

    #[test]
    fn test_zero_delay_is_absent() {
        let job = parse(json!({"id": "j", "status": "new", "recommended_pull_delay_ms": 0})).unwrap();
        assert!(job.recommended_pull_delay.is_none());
    }

    #[test]
    fn test_null_items_is_empty() {
        let job = parse(json!({"id": "j", "status": "new", "job_items": null})).unwrap();
        assert!(job.job_items.is_empty());
    }

    #[test]
    fn test_missing_status_is_malformed() {
        let result = parse(json!({"id": "j"}));
        assert!(matches!(result, Err(WebCrawlerError::MalformedResponse(_))));
    }

    #[test]
    fn test_not_an_object_is_malformed() {
        let result = parse(json!(["job"]));
        assert!(matches!(result, Err(WebCrawlerError::MalformedResponse(m)) if m.contains("array")));
    }

    #[test]
    fn test_unknown_item_status_fails_job() {
        let result = parse(json!({
            "id": "j",
            "status": "in_progress",
            "job_items": [{"id": "i1", "status": "paused"}]
        }));
        assert!(matches!(result, Err(WebCrawlerError::UnknownStatus(s)) if s == "paused"));
    }

    #[test]
    fn test_unknown_scrape_type_is_malformed() {
        let result = parse(json!({"id": "j", "status": "new", "scrape_type": "pdf"}));
        assert!(matches!(result, Err(WebCrawlerError::MalformedResponse(_))));
    }

    #[test]
    fn test_submission_with_only_an_id_is_new() {
        let fetcher = ContentFetcher::default();

        let job = parse_job_submission(json!({"job_id": "job_1"}), &fetcher).unwrap();
        assert_eq!(job.id, "job_1");
        assert_eq!(job.status, JobStatus::New);
        assert!(!job.is_terminal());

        let job = parse_job_submission(json!({"id": "job_2", "status": "in_progress"}), &fetcher)
            .unwrap();
        assert_eq!(job.status, JobStatus::InProgress);
    }

    #[test]
    fn test_submission_still_needs_id_and_known_status() {
        let fetcher = ContentFetcher::default();

        assert!(matches!(
            parse_job_submission(json!({}), &fetcher),
            Err(WebCrawlerError::MalformedResponse(_))
        ));
        assert!(matches!(
            parse_job_submission(json!({"id": "j", "status": "queued"}), &fetcher),
            Err(WebCrawlerError::UnknownStatus(_))
        ));
    }

    #[test]
    fn test_cancel_confirmation_bodies() {
        let confirmation =
            CancelConfirmation::from_value(json!({"message": "Job canceled"})).unwrap();
        assert_eq!(confirmation.message.as_deref(), Some("Job canceled"));

        let confirmation = CancelConfirmation::from_value(json!("canceled")).unwrap();
        assert_eq!(confirmation.message.as_deref(), Some("canceled"));

        assert_eq!(
            CancelConfirmation::from_value(Value::Null).unwrap(),
            CancelConfirmation::default()
        );
        assert_eq!(
            CancelConfirmation::from_value(json!({})).unwrap(),
            CancelConfirmation::default()
        );
    }

    #[test]
    fn test_cancel_confirmation_wrong_message_type() {
        let result = CancelConfirmation::from_value(json!({"message": 42}));
        assert!(matches!(result, Err(WebCrawlerError::MalformedResponse(_))));
    }
}
