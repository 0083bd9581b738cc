//! Client façade
//!
//! `WebCrawlerClient` ties transport, parsing, and polling together into the
//! public operations:
//!
//! | Operation | Endpoint | Polls |
//! |-----------|----------|-------|
//! | `submit_crawl` | `POST /v1/crawl` | no |
//! | `crawl` | `POST /v1/crawl`, then `GET /v1/job/{id}` | yes |
//! | `get_job` | `GET /v1/job/{id}` | no |
//! | `cancel_job` | `POST /v1/job/{id}/cancel` | no |
//! | `submit_scrape` | `POST /v2/scrape` | no |
//! | `scrape` | `POST /v2/scrape`, then `GET /v2/scrape/{id}` | yes |
//! | `get_scrape` | `GET /v2/scrape/{id}` | no |

mod params;

pub use params::{CrawlParams, ScrapeParams, DEFAULT_ITEMS_LIMIT};

use crate::config::{validate, ClientConfig, PollSettings};
use crate::model::{
    parse_job, parse_job_submission, parse_scrape, parse_scrape_submission, CancelConfirmation,
    Job, JobStatus, Scrape, ScrapeOutcome,
};
use crate::poll::{poll_until_terminal, PollOptions, Sleeper, TokioSleeper};
use crate::transport::{ContentFetcher, Transport};
use crate::WebCrawlerError;
use reqwest::Method;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;

/// What the server did with a scrape submission
#[derive(Debug, Clone)]
pub enum ScrapeSubmission {
    /// The server answered with the finished result
    Completed(ScrapeOutcome),

    /// The server queued the scrape; poll `get_scrape(id)` for the result
    Accepted { id: String, status: JobStatus },
}

/// Client for the WebCrawlerAPI service
///
/// Cheap to clone; clones share the connection pool. The API key is fixed at
/// construction.
///
/// # Example
///
/// ```no_run
/// use webcrawlerapi::{ClientConfig, CrawlParams, ScrapeType, WebCrawlerClient};
///
/// # async fn run() -> webcrawlerapi::Result<()> {
/// let client = WebCrawlerClient::new(ClientConfig::new("my-api-key"))?;
/// let job = client
///     .crawl(&CrawlParams::new("https://example.com").scrape_type(ScrapeType::Markdown))
///     .await?;
///
/// for item in job.done_items() {
///     println!("{}", item.content().await?);
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct WebCrawlerClient {
    transport: Transport,
    fetcher: ContentFetcher,
    polling: PollSettings,
    sleeper: Arc<dyn Sleeper>,
}

impl WebCrawlerClient {
    /// Creates a client from configuration
    ///
    /// # Errors
    ///
    /// * `Config` - The configuration fails validation
    /// * `Transport` - The HTTP client could not be built
    pub fn new(config: ClientConfig) -> Result<Self, WebCrawlerError> {
        validate(&config)?;

        let transport = Transport::new(&config)?;
        let fetcher = transport.content_fetcher();

        Ok(Self {
            transport,
            fetcher,
            polling: config.polling,
            sleeper: Arc::new(TokioSleeper),
        })
    }

    /// Creates a client from `WEBCRAWLERAPI_API_KEY` / `WEBCRAWLERAPI_BASE_URL`
    pub fn from_env() -> Result<Self, WebCrawlerError> {
        Self::new(ClientConfig::from_env()?)
    }

    /// Replaces the delay source used between status checks
    pub fn with_sleeper(mut self, sleeper: Arc<dyn Sleeper>) -> Self {
        self.sleeper = sleeper;
        self
    }

    // ===== Crawl =====

    /// Starts a crawl and returns the job as first reported
    ///
    /// Does not wait; the returned job is usually `new`.
    pub async fn submit_crawl(&self, params: &CrawlParams) -> Result<Job, WebCrawlerError> {
        let body = params.to_body()?;
        let response = self
            .transport
            .send_json(Method::POST, &["v1", "crawl"], Some(&body))
            .await?;
        let job = parse_job_submission(response, &self.fetcher)?;

        tracing::info!("Submitted crawl job {} for {}", job.id, params.url);
        Ok(job)
    }

    /// Starts a crawl and waits until it is done, failed, or canceled
    ///
    /// # Errors
    ///
    /// * `PollTimeout` - The poll ceiling was reached; the error holds the
    ///   last job snapshot
    /// * Any error from submission or a status check
    pub async fn crawl(&self, params: &CrawlParams) -> Result<Job, WebCrawlerError> {
        let submitted = self.submit_crawl(params).await?;
        if submitted.is_terminal() {
            return Ok(submitted);
        }

        let options = self.poll_options(params.max_polls, params.poll_interval_override);
        let job_id = submitted.id;
        let job = poll_until_terminal(|| self.get_job(&job_id), &options, self.sleeper.as_ref())
            .await?;

        tracing::info!(
            "Crawl job {} finished as {} with {} item(s)",
            job.id,
            job.status,
            job.job_items.len()
        );
        Ok(job)
    }

    /// Fetches the current state of a job
    pub async fn get_job(&self, job_id: &str) -> Result<Job, WebCrawlerError> {
        let job_id = require_id("job_id", job_id)?;
        let response = self
            .transport
            .send_json(Method::GET, &["v1", "job", job_id], None)
            .await?;
        parse_job(response, &self.fetcher)
    }

    /// Asks the server to cancel a job
    ///
    /// Items not yet started are canceled server-side; finished items are
    /// left alone. Local `Job` snapshots are not touched; fetch the job again
    /// to see the result.
    pub async fn cancel_job(&self, job_id: &str) -> Result<CancelConfirmation, WebCrawlerError> {
        let job_id = require_id("job_id", job_id)?;
        let response = self
            .transport
            .send(Method::POST, &["v1", "job", job_id, "cancel"], None)
            .await?;

        let value = response
            .json()
            .unwrap_or_else(|_| Value::String(response.body.trim().to_string()));

        let confirmation = CancelConfirmation::from_value(value)?;
        tracing::info!("Requested cancellation of job {}", job_id);
        Ok(confirmation)
    }

    // ===== Scrape =====

    /// Submits a single-page scrape
    ///
    /// The server either answers with the result straight away or queues the
    /// scrape and returns its identifier.
    pub async fn submit_scrape(
        &self,
        params: &ScrapeParams,
    ) -> Result<ScrapeSubmission, WebCrawlerError> {
        let body = params.to_body()?;
        let response = self
            .transport
            .send_json(Method::POST, &["v2", "scrape"], Some(&body))
            .await?;
        let scrape = parse_scrape_submission(response, &self.fetcher)?;

        let status = scrape.status;
        match (scrape.outcome, scrape.id) {
            (Some(outcome), _) => {
                tracing::info!("Scrape of {} completed inline", params.url);
                Ok(ScrapeSubmission::Completed(outcome))
            }
            (None, Some(id)) => {
                tracing::info!("Submitted scrape {} for {}", id, params.url);
                Ok(ScrapeSubmission::Accepted { id, status })
            }
            (None, None) => Err(WebCrawlerError::MalformedResponse(
                "pending scrape is missing required field 'id'".to_string(),
            )),
        }
    }

    /// Scrapes a page, polling until the result is in
    ///
    /// A failed scrape is returned as `ScrapeOutcome::Error`, not as an `Err`.
    pub async fn scrape(&self, params: &ScrapeParams) -> Result<ScrapeOutcome, WebCrawlerError> {
        let id = match self.submit_scrape(params).await? {
            ScrapeSubmission::Completed(outcome) => return Ok(outcome),
            ScrapeSubmission::Accepted { id, .. } => id,
        };

        let options = self.poll_options(params.max_polls, params.poll_interval_override);
        let scrape =
            poll_until_terminal(|| self.get_scrape(&id), &options, self.sleeper.as_ref()).await?;

        tracing::info!("Scrape {} finished as {}", id, scrape.status);
        scrape.into_outcome().ok_or_else(|| {
            WebCrawlerError::MalformedResponse(format!("scrape {} ended without a result", id))
        })
    }

    /// Fetches the current state of a scrape
    pub async fn get_scrape(&self, scrape_id: &str) -> Result<Scrape, WebCrawlerError> {
        let scrape_id = require_id("scrape_id", scrape_id)?;
        let response = self
            .transport
            .send_json(Method::GET, &["v2", "scrape", scrape_id], None)
            .await?;
        parse_scrape(response, &self.fetcher)
    }

    fn poll_options(&self, max_polls: Option<u32>, interval: Option<Duration>) -> PollOptions {
        PollOptions::new(
            max_polls.unwrap_or(self.polling.max_polls),
            interval.unwrap_or_else(|| self.polling.poll_interval()),
        )
    }
}

fn require_id<'a>(name: &str, id: &'a str) -> Result<&'a str, WebCrawlerError> {
    let id = id.trim();
    if id.is_empty() {
        return Err(WebCrawlerError::InvalidRequest(format!(
            "{} cannot be empty",
            name
        )));
    }
    Ok(id)
}
