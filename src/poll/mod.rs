//! Poll engine
//!
//! Repeats a status fetch until the entity reaches a terminal state or the
//! attempt ceiling is hit. Between fetches it sleeps for the server's
//! suggested delay when one is given, otherwise for the configured default.
//! There is no backoff of its own and no wall-clock limit; wrap the call in
//! `tokio::time::timeout` for a deadline.
//!
//! Errors from `fetch` end the loop immediately. Only "not terminal yet" is
//! retried.

mod sleeper;

pub use sleeper::{RecordingSleeper, Sleeper, TokioSleeper};

use crate::model::{Job, JobStatus, Scrape};
use crate::WebCrawlerError;
use std::future::Future;
use std::time::Duration;

/// An entity the engine can poll
pub trait Pollable: Sized {
    /// Returns true if no further status change will happen
    fn is_terminal(&self) -> bool;

    /// Server hint for the next sleep, if any
    fn suggested_delay(&self) -> Option<Duration>;

    /// Wraps the entity for a timeout error
    fn into_snapshot(self) -> PollSnapshot;
}

impl Pollable for Job {
    fn is_terminal(&self) -> bool {
        Job::is_terminal(self)
    }

    fn suggested_delay(&self) -> Option<Duration> {
        self.recommended_pull_delay
    }

    fn into_snapshot(self) -> PollSnapshot {
        PollSnapshot::Job(self)
    }
}

impl Pollable for Scrape {
    fn is_terminal(&self) -> bool {
        Scrape::is_terminal(self)
    }

    fn suggested_delay(&self) -> Option<Duration> {
        self.recommended_pull_delay
    }

    fn into_snapshot(self) -> PollSnapshot {
        PollSnapshot::Scrape(self)
    }
}

/// Last entity observed before the engine gave up
#[derive(Debug, Clone)]
pub enum PollSnapshot {
    Job(Job),
    Scrape(Scrape),
}

impl PollSnapshot {
    pub fn status(&self) -> JobStatus {
        match self {
            Self::Job(job) => job.status,
            Self::Scrape(scrape) => scrape.status,
        }
    }

    pub fn as_job(&self) -> Option<&Job> {
        match self {
            Self::Job(job) => Some(job),
            Self::Scrape(_) => None,
        }
    }

    pub fn as_scrape(&self) -> Option<&Scrape> {
        match self {
            Self::Scrape(scrape) => Some(scrape),
            Self::Job(_) => None,
        }
    }

    pub fn into_job(self) -> Option<Job> {
        match self {
            Self::Job(job) => Some(job),
            Self::Scrape(_) => None,
        }
    }

    pub fn into_scrape(self) -> Option<Scrape> {
        match self {
            Self::Scrape(scrape) => Some(scrape),
            Self::Job(_) => None,
        }
    }
}

/// Attempt ceiling and fallback delay for one polling call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollOptions {
    /// Fetches allowed before giving up; zero is treated as one
    pub max_attempts: u32,

    /// Sleep used when the entity carries no suggested delay
    pub default_delay: Duration,
}

impl PollOptions {
    pub fn new(max_attempts: u32, default_delay: Duration) -> Self {
        Self {
            max_attempts,
            default_delay,
        }
    }
}

/// Fetches until the entity is terminal
///
/// # Arguments
///
/// * `fetch` - Performs one status query
/// * `options` - Attempt ceiling and default delay
/// * `sleeper` - Delay source between fetches
///
/// # Returns
///
/// * `Ok(entity)` - The first terminal entity; no sleep follows it
/// * `Err(PollTimeout)` - `max_attempts` fetches all came back non-terminal;
///   the error carries the last one
/// * `Err(_)` - Any error from `fetch`, unchanged
pub async fn poll_until_terminal<T, F, Fut>(
    mut fetch: F,
    options: &PollOptions,
    sleeper: &dyn Sleeper,
) -> Result<T, WebCrawlerError>
where
    T: Pollable,
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, WebCrawlerError>>,
{
    let max_attempts = options.max_attempts.max(1);
    let mut attempts = 0;

    loop {
        attempts += 1;
        let entity = fetch().await?;

        if entity.is_terminal() {
            tracing::debug!("Terminal state reached after {} poll(s)", attempts);
            return Ok(entity);
        }

        if attempts >= max_attempts {
            let snapshot = entity.into_snapshot();
            tracing::warn!(
                "Giving up after {} poll(s), last status {}",
                attempts,
                snapshot.status()
            );
            return Err(WebCrawlerError::PollTimeout {
                attempts,
                last: Box::new(snapshot),
            });
        }

        let delay = entity.suggested_delay().unwrap_or(options.default_delay);
        tracing::trace!("Poll {} not terminal, sleeping {:?}", attempts, delay);
        sleeper.sleep(delay).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::parse_job;
    use crate::transport::ContentFetcher;
    use serde_json::{json, Value};
    use std::cell::Cell;

    fn job(value: Value) -> Job {
        parse_job(value, &ContentFetcher::default()).unwrap()
    }

    fn options(max_attempts: u32) -> PollOptions {
        PollOptions::new(max_attempts, Duration::from_secs(5))
    }

    #[tokio::test]
    async fn test_terminal_on_first_fetch_does_not_sleep() {
        let sleeper = RecordingSleeper::new();
        let calls = Cell::new(0);

        let result = poll_until_terminal(
            || {
                calls.set(calls.get() + 1);
                async { Ok(job(json!({"id": "j", "status": "done"}))) }
            },
            &options(10),
            &sleeper,
        )
        .await
        .unwrap();

        assert_eq!(result.status, JobStatus::Done);
        assert_eq!(calls.get(), 1);
        assert!(sleeper.delays().is_empty());
    }

    #[tokio::test]
    async fn test_ceiling_makes_exactly_n_fetches() {
        let sleeper = RecordingSleeper::new();
        let calls = Cell::new(0u32);

        let result = poll_until_terminal(
            || {
                calls.set(calls.get() + 1);
                let items: Vec<Value> = (0..calls.get())
                    .map(|i| json!({"id": format!("i{}", i), "status": "done"}))
                    .collect();
                async move {
                    Ok(job(json!({
                        "id": "j",
                        "status": "in_progress",
                        "job_items": items
                    })))
                }
            },
            &options(4),
            &sleeper,
        )
        .await;

        assert_eq!(calls.get(), 4);
        assert_eq!(sleeper.delays().len(), 3);

        match result {
            Err(WebCrawlerError::PollTimeout { attempts, last }) => {
                assert_eq!(attempts, 4);
                let last = last.into_job().unwrap();
                assert_eq!(last.status, JobStatus::InProgress);
                // Snapshot is the fourth fetch, not an earlier one
                assert_eq!(last.job_items.len(), 4);
            }
            other => panic!("expected PollTimeout, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_suggested_delay_overrides_default() {
        let sleeper = RecordingSleeper::new();
        let calls = Cell::new(0);

        poll_until_terminal(
            || {
                calls.set(calls.get() + 1);
                let payload = match calls.get() {
                    1 => json!({"id": "j", "status": "new", "recommended_pull_delay_ms": 750}),
                    2 => json!({"id": "j", "status": "in_progress"}),
                    _ => json!({"id": "j", "status": "done"}),
                };
                async move { Ok(job(payload)) }
            },
            &options(10),
            &sleeper,
        )
        .await
        .unwrap();

        assert_eq!(
            sleeper.delays(),
            vec![Duration::from_millis(750), Duration::from_secs(5)]
        );
    }

    #[tokio::test]
    async fn test_fetch_error_stops_immediately() {
        let sleeper = RecordingSleeper::new();
        let calls = Cell::new(0);

        let result: Result<Job, _> = poll_until_terminal(
            || {
                calls.set(calls.get() + 1);
                async { Err(WebCrawlerError::UnknownStatus("paused".to_string())) }
            },
            &options(10),
            &sleeper,
        )
        .await;

        assert!(matches!(result, Err(WebCrawlerError::UnknownStatus(_))));
        assert_eq!(calls.get(), 1);
        assert!(sleeper.delays().is_empty());
    }

    #[tokio::test]
    async fn test_zero_attempts_still_fetches_once() {
        let sleeper = RecordingSleeper::new();
        let calls = Cell::new(0);

        let result = poll_until_terminal(
            || {
                calls.set(calls.get() + 1);
                async { Ok(job(json!({"id": "j", "status": "new"}))) }
            },
            &options(0),
            &sleeper,
        )
        .await;

        assert_eq!(calls.get(), 1);
        assert!(matches!(
            result,
            Err(WebCrawlerError::PollTimeout { attempts: 1, .. })
        ));
    }

    #[test]
    fn test_snapshot_accessors() {
        let snapshot = job(json!({"id": "j", "status": "scraping"})).into_snapshot();
        assert_eq!(snapshot.status(), JobStatus::Scraping);
        assert!(snapshot.as_job().is_some());
        assert!(snapshot.as_scrape().is_none());
    }
}
