//! HTTP transport for the API
//!
//! This module handles every network call the client makes:
//! - Authenticated JSON calls against the API (`Transport`)
//! - Unauthenticated GETs against content locators (`ContentFetcher`)
//! - Mapping non-2xx responses to `WebCrawlerError::Transport`
//!
//! Nothing here retries. One-shot calls fail straight to the caller and the
//! poll engine decides when to ask again.

mod fetcher;

pub use fetcher::ContentFetcher;

use crate::config::ClientConfig;
use crate::{ConfigError, WebCrawlerError};
use reqwest::{Client, Method, StatusCode};
use serde_json::Value;
use url::Url;

const USER_AGENT: &str = concat!("webcrawlerapi-rust/", env!("CARGO_PKG_VERSION"));

/// Raw response from a successful (2xx) API call
#[derive(Debug, Clone)]
pub struct RawResponse {
    /// HTTP status code
    pub status: u16,

    /// Response body text
    pub body: String,
}

impl RawResponse {
    /// Parses the body as JSON; an empty body is `null`
    pub fn json(&self) -> Result<Value, WebCrawlerError> {
        if self.body.trim().is_empty() {
            return Ok(Value::Null);
        }

        serde_json::from_str(&self.body)
            .map_err(|e| WebCrawlerError::MalformedResponse(format!("invalid JSON body: {}", e)))
    }
}

/// Authenticated API transport
#[derive(Debug, Clone)]
pub struct Transport {
    client: Client,
    base_url: Url,
    api_key: String,
}

/// Builds the shared HTTP client
pub fn build_http_client(config: &ClientConfig) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(USER_AGENT)
        .timeout(config.request_timeout())
        .connect_timeout(std::time::Duration::from_secs(10))
        .gzip(true)
        .brotli(true)
        .build()
}

impl Transport {
    /// Creates a transport from validated configuration
    ///
    /// The API key is copied once here and never re-read.
    pub fn new(config: &ClientConfig) -> Result<Self, WebCrawlerError> {
        let client = build_http_client(config).map_err(|e| WebCrawlerError::Transport {
            status: None,
            message: format!("failed to build HTTP client: {}", e),
        })?;

        Self::with_client(client, config)
    }

    /// Creates a transport around an existing `reqwest::Client`
    pub fn with_client(client: Client, config: &ClientConfig) -> Result<Self, WebCrawlerError> {
        let base_url = Url::parse(config.base_url.trim_end_matches('/')).map_err(|e| {
            ConfigError::InvalidUrl(format!("Invalid base_url '{}': {}", config.base_url, e))
        })?;

        Ok(Self {
            client,
            base_url,
            api_key: config.api_key.clone(),
        })
    }

    /// Returns a fetcher for content locators that shares this connection pool
    pub fn content_fetcher(&self) -> ContentFetcher {
        ContentFetcher::with_client(self.client.clone())
    }

    /// Resolves path segments against the base URL, percent-encoding each one
    pub fn endpoint(&self, segments: &[&str]) -> Result<Url, WebCrawlerError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| {
                WebCrawlerError::InvalidRequest(format!(
                    "base URL '{}' cannot carry a path",
                    self.base_url
                ))
            })?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// Sends an authenticated request
    ///
    /// # Arguments
    ///
    /// * `method` - HTTP method
    /// * `segments` - Path segments below the base URL, e.g. `["v1", "job", id]`
    /// * `body` - Optional JSON body
    ///
    /// # Returns
    ///
    /// * `Ok(RawResponse)` - The server answered with a 2xx status
    /// * `Err(Transport)` - Non-2xx status or network failure
    pub async fn send(
        &self,
        method: Method,
        segments: &[&str],
        body: Option<&Value>,
    ) -> Result<RawResponse, WebCrawlerError> {
        let url = self.endpoint(segments)?;
        tracing::debug!("{} {}", method, url);

        let mut request = self
            .client
            .request(method.clone(), url.clone())
            .bearer_auth(&self.api_key);
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await.map_err(|e| network_error(&e))?;
        let status = response.status();
        let text = response.text().await.map_err(|e| network_error(&e))?;

        tracing::debug!("{} {} -> {}", method, url, status.as_u16());

        if !status.is_success() {
            return Err(WebCrawlerError::Transport {
                status: Some(status.as_u16()),
                message: error_message(status, &text),
            });
        }

        Ok(RawResponse {
            status: status.as_u16(),
            body: text,
        })
    }

    /// Sends a request and parses the response body as JSON
    pub async fn send_json(
        &self,
        method: Method,
        segments: &[&str],
        body: Option<&Value>,
    ) -> Result<Value, WebCrawlerError> {
        self.send(method, segments, body).await?.json()
    }
}

fn network_error(e: &reqwest::Error) -> WebCrawlerError {
    let message = if e.is_timeout() {
        "Request timeout".to_string()
    } else if e.is_connect() {
        format!("Connection failed: {}", e)
    } else {
        e.to_string()
    };

    WebCrawlerError::Transport {
        status: None,
        message,
    }
}

/// Extracts the most useful error text from a non-2xx body
///
/// Prefers a JSON `error` or `message` string, then the raw body, then the
/// canonical reason phrase.
pub(crate) fn error_message(status: StatusCode, body: &str) -> String {
    if let Ok(Value::Object(map)) = serde_json::from_str::<Value>(body) {
        for key in ["error", "message"] {
            if let Some(Value::String(message)) = map.get(key) {
                if !message.is_empty() {
                    return message.clone();
                }
            }
        }
    }

    let trimmed = body.trim();
    if !trimmed.is_empty() {
        return trimmed.to_string();
    }

    status
        .canonical_reason()
        .unwrap_or("unknown error")
        .to_string()
}
