/// Status definitions shared by jobs, job items, and scrapes
///
/// The server owns every transition; the client only reads the current value.
use crate::WebCrawlerError;
use std::fmt;

/// Lifecycle state reported by the API
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JobStatus {
    // ===== Active States =====
    /// Accepted but not started
    New,

    /// Being crawled
    InProgress,

    /// Pages fetched, content extraction still running
    Scraping,

    // ===== Terminal States =====
    /// Finished successfully
    Done,

    /// Finished with a failure
    Error,

    /// Stopped by a cancel request
    Canceled,
}

impl JobStatus {
    /// Returns true if the server will never move this status again
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done | Self::Error | Self::Canceled)
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Done)
    }

    /// Wire representation used by the API
    pub fn as_api_str(&self) -> &'static str {
        match self {
            Self::New => "new",
            Self::InProgress => "in_progress",
            Self::Scraping => "scraping",
            Self::Done => "done",
            Self::Error => "error",
            Self::Canceled => "canceled",
        }
    }

    /// Matches a wire string exactly (case-sensitive)
    ///
    /// Returns None if the string doesn't match any known status.
    pub fn from_api_str(s: &str) -> Option<Self> {
        match s {
            "new" => Some(Self::New),
            "in_progress" => Some(Self::InProgress),
            "scraping" => Some(Self::Scraping),
            "done" => Some(Self::Done),
            "error" => Some(Self::Error),
            "canceled" => Some(Self::Canceled),
            _ => None,
        }
    }

    /// Parses a status received from the server
    ///
    /// Unrecognized values are a protocol mismatch and fail with
    /// `UnknownStatus` instead of falling back to a default.
    pub fn parse(s: &str) -> Result<Self, WebCrawlerError> {
        Self::from_api_str(s).ok_or_else(|| WebCrawlerError::UnknownStatus(s.to_string()))
    }

    /// Returns all possible statuses
    pub fn all_statuses() -> Vec<Self> {
        vec![
            Self::New,
            Self::InProgress,
            Self::Scraping,
            Self::Done,
            Self::Error,
            Self::Canceled,
        ]
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_api_str())
    }
}
