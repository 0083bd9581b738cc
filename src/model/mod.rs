//! Typed views of API responses
//!
//! Server payloads are validated once, at the parse boundary. Required fields
//! that are missing fail with `MalformedResponse`, status strings outside the
//! known set fail with `UnknownStatus`, and unknown extra fields are ignored.
//!
//! # Components
//!
//! - `JobStatus` / `ScrapeType`: shared enums for job, item, and scrape state
//! - `Job` / `JobItem`: a crawl and the pages it produced
//! - `Scrape` / `ScrapeOutcome`: a single-page scrape and its result
//! - `Action`: post-processing instructions sent with a submission
//! - `LazyContent`: the fetch-once cache behind every `content()` accessor

mod action;
mod content;
mod job;
mod job_item;
mod scrape;
mod scrape_type;
mod status;

pub use action::Action;
pub use content::LazyContent;
pub use job::{parse_job, parse_job_submission, CancelConfirmation, Job};
pub use job_item::{parse_job_item, JobItem};
pub use scrape::{
    parse_scrape, parse_scrape_result, parse_scrape_submission, Scrape, ScrapeOutcome,
    ScrapeResult, ScrapeResultError,
};
pub use scrape_type::ScrapeType;
pub use status::JobStatus;

use crate::WebCrawlerError;
use serde::de::DeserializeOwned;
use serde_json::Value;

/// Deserializes a loosely-typed payload, reporting shape errors as malformed
pub(crate) fn from_payload<T: DeserializeOwned>(what: &str, value: Value) -> Result<T, WebCrawlerError> {
    if !value.is_object() {
        return Err(WebCrawlerError::MalformedResponse(format!(
            "{} payload must be a JSON object, got {}",
            what,
            json_kind(&value)
        )));
    }

    serde_json::from_value(value)
        .map_err(|e| WebCrawlerError::MalformedResponse(format!("{} payload: {}", what, e)))
}

/// Unwraps a required field, naming it in the error when absent
pub(crate) fn required<T>(what: &str, field: &str, value: Option<T>) -> Result<T, WebCrawlerError> {
    value.ok_or_else(|| {
        WebCrawlerError::MalformedResponse(format!("{} is missing required field '{}'", what, field))
    })
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
