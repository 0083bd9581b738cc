//! Content locator fetcher
//!
//! Locators are pre-signed or public URLs, so these GETs never carry the API
//! credential. The only assumption about a locator is that a plain GET
//! returns the page body.

use crate::WebCrawlerError;
use reqwest::Client;

/// Issues unauthenticated GETs against content locators
#[derive(Debug, Clone, Default)]
pub struct ContentFetcher {
    client: Client,
}

impl ContentFetcher {
    pub fn with_client(client: Client) -> Self {
        Self { client }
    }

    /// Fetches the body behind a locator as text
    ///
    /// # Returns
    ///
    /// * `Ok(String)` - The body of a 2xx response
    /// * `Err(Fetch)` - Network failure, non-2xx status, or undecodable body
    pub async fn fetch_text(&self, url: &str) -> Result<String, WebCrawlerError> {
        tracing::debug!("GET {} (content)", url);

        let fetch_error = |message: String| WebCrawlerError::Fetch {
            url: url.to_string(),
            message,
        };

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| fetch_error(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(fetch_error(format!(
                "HTTP {}: {}",
                status.as_u16(),
                super::error_message(status, &body)
            )));
        }

        response.text().await.map_err(|e| fetch_error(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_invalid_locator_is_fetch_error() {
        let fetcher = ContentFetcher::default();
        let result = fetcher.fetch_text("not a url").await;

        match result {
            Err(WebCrawlerError::Fetch { url, .. }) => assert_eq!(url, "not a url"),
            other => panic!("expected Fetch error, got {:?}", other),
        }
    }
}
