//! WebCrawlerAPI client
//!
//! This crate talks to the WebCrawlerAPI service: it submits crawl and scrape
//! jobs, polls them until the server reports a terminal state, and fetches
//! page content lazily from the locators the server hands back.

pub mod client;
pub mod config;
pub mod model;
pub mod poll;
pub mod timestamp;
pub mod transport;

use thiserror::Error;

/// Main error type for WebCrawlerAPI operations
#[derive(Debug, Error)]
pub enum WebCrawlerError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("{}", transport_message(.status, .message))]
    Transport {
        status: Option<u16>,
        message: String,
    },

    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    #[error("Unknown status: {0:?}")]
    UnknownStatus(String),

    #[error("Content for {item_id} is not ready yet")]
    ContentNotReady { item_id: String },

    #[error("Failed to fetch content from {url}: {message}")]
    Fetch { url: String, message: String },

    #[error("Gave up after {attempts} polls, last status: {}", .last.status())]
    PollTimeout {
        attempts: u32,
        last: Box<poll::PollSnapshot>,
    },
}

fn transport_message(status: &Option<u16>, message: &str) -> String {
    match status {
        Some(code) => format!("HTTP {}: {}", code, message),
        None => format!("Network error: {}", message),
    }
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),

    #[error("API key is missing (set {0})")]
    MissingApiKey(&'static str),
}

/// Result type alias for WebCrawlerAPI operations
pub type Result<T> = std::result::Result<T, WebCrawlerError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use client::{CrawlParams, ScrapeParams, ScrapeSubmission, WebCrawlerClient};
pub use config::ClientConfig;
pub use model::{
    Action, CancelConfirmation, Job, JobItem, JobStatus, Scrape, ScrapeOutcome, ScrapeResult,
    ScrapeResultError, ScrapeType,
};
pub use poll::{PollSnapshot, Sleeper, TokioSleeper};
