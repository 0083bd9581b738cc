use crate::config::validation::validate;
use crate::{ConfigError, ConfigResult};
use serde::Deserialize;
use std::time::Duration;

/// Production endpoint of the service
pub const DEFAULT_BASE_URL: &str = "https://api.webcrawlerapi.com";

/// Environment variable holding the API key
pub const API_KEY_ENV: &str = "WEBCRAWLERAPI_API_KEY";

/// Environment variable overriding the base URL
pub const BASE_URL_ENV: &str = "WEBCRAWLERAPI_BASE_URL";

/// Status checks performed before a polling call gives up
pub const DEFAULT_MAX_POLLS: u32 = 100;

/// Delay between status checks when the server suggests none
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 5_000;

pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 60;

/// Main configuration structure for the client
#[derive(Debug, Clone, Deserialize)]
pub struct ClientConfig {
    /// Bearer credential attached to every API call
    #[serde(rename = "api-key")]
    pub api_key: String,

    /// Root of the API, without a trailing slash
    #[serde(rename = "base-url", default = "default_base_url")]
    pub base_url: String,

    /// Per-request timeout for API and content calls (seconds)
    #[serde(
        rename = "request-timeout-secs",
        default = "default_request_timeout_secs"
    )]
    pub request_timeout_secs: u64,

    #[serde(default)]
    pub polling: PollSettings,
}

/// Polling defaults applied when a call does not override them
#[derive(Debug, Clone, Deserialize)]
pub struct PollSettings {
    /// Maximum number of status checks per polling call
    #[serde(rename = "max-polls", default = "default_max_polls")]
    pub max_polls: u32,

    /// Delay between status checks (milliseconds)
    #[serde(rename = "poll-interval-ms", default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
}

impl Default for PollSettings {
    fn default() -> Self {
        Self {
            max_polls: DEFAULT_MAX_POLLS,
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
        }
    }
}

impl PollSettings {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_request_timeout_secs() -> u64 {
    DEFAULT_REQUEST_TIMEOUT_SECS
}

fn default_max_polls() -> u32 {
    DEFAULT_MAX_POLLS
}

fn default_poll_interval_ms() -> u64 {
    DEFAULT_POLL_INTERVAL_MS
}

impl ClientConfig {
    /// Creates a configuration for the production endpoint
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: default_base_url(),
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            polling: PollSettings::default(),
        }
    }

    /// Points the client at a different API root
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Builds a configuration from `WEBCRAWLERAPI_API_KEY` and the optional
    /// `WEBCRAWLERAPI_BASE_URL`
    pub fn from_env() -> ConfigResult<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub(crate) fn from_lookup<F>(lookup: F) -> ConfigResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_key = lookup(API_KEY_ENV)
            .filter(|key| !key.trim().is_empty())
            .ok_or(ConfigError::MissingApiKey(API_KEY_ENV))?;

        let mut config = Self::new(api_key);
        if let Some(base_url) = lookup(BASE_URL_ENV).filter(|url| !url.trim().is_empty()) {
            config.base_url = base_url;
        }

        config.base_url = config.base_url.trim_end_matches('/').to_string();
        validate(&config)?;
        Ok(config)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}
