//! Fetch-once page content
//!
//! A `LazyContent` is either unfetched or fetched. The first `get` resolves
//! the locator and stores the body; later calls return the stored body
//! without touching the network. Concurrent first calls on the same instance
//! share a single fetch.

use crate::transport::ContentFetcher;
use crate::WebCrawlerError;
use tokio::sync::OnceCell;

/// Page content owned by a job item or scrape result
#[derive(Debug, Clone)]
pub struct LazyContent {
    owner_id: String,
    locator: Option<String>,
    cell: OnceCell<String>,
    fetcher: ContentFetcher,
}

impl LazyContent {
    /// Content that will be fetched from `locator` on first access
    pub fn deferred(
        owner_id: impl Into<String>,
        locator: Option<String>,
        fetcher: ContentFetcher,
    ) -> Self {
        Self {
            owner_id: owner_id.into(),
            locator: locator.filter(|url| !url.trim().is_empty()),
            cell: OnceCell::new(),
            fetcher,
        }
    }

    /// Content the server already returned inline
    pub fn inline(owner_id: impl Into<String>, body: String, fetcher: ContentFetcher) -> Self {
        Self {
            owner_id: owner_id.into(),
            locator: None,
            cell: OnceCell::new_with(Some(body)),
            fetcher,
        }
    }

    /// URL the content is fetched from, if the server has published one
    pub fn locator(&self) -> Option<&str> {
        self.locator.as_deref()
    }

    /// Returns true once the body is held locally
    pub fn is_loaded(&self) -> bool {
        self.cell.initialized()
    }

    /// Returns true if a call to `get` can succeed without the server
    /// publishing anything new
    pub fn is_available(&self) -> bool {
        self.is_loaded() || self.locator.is_some()
    }

    /// Returns the content, fetching it on first use
    ///
    /// # Returns
    ///
    /// * `Ok(&str)` - The body, possibly empty
    /// * `Err(ContentNotReady)` - No locator has been published yet
    /// * `Err(Fetch)` - The locator GET failed; a later call retries it
    pub async fn get(&self) -> Result<&str, WebCrawlerError> {
        if let Some(body) = self.cell.get() {
            return Ok(body.as_str());
        }

        let url = self
            .locator
            .as_deref()
            .ok_or_else(|| WebCrawlerError::ContentNotReady {
                item_id: self.owner_id.clone(),
            })?;

        let body = self
            .cell
            .get_or_try_init(|| async {
                tracing::debug!("Loading content for {} from {}", self.owner_id, url);
                self.fetcher.fetch_text(url).await
            })
            .await?;

        Ok(body.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_inline_content_needs_no_locator() {
        let content = LazyContent::inline("s1", "hello".to_string(), ContentFetcher::default());
        assert!(content.is_loaded());
        assert_eq!(content.get().await.unwrap(), "hello");
    }

    #[tokio::test]
    async fn test_missing_locator_is_not_ready() {
        let content = LazyContent::deferred("i1", None, ContentFetcher::default());
        assert!(!content.is_available());

        match content.get().await {
            Err(WebCrawlerError::ContentNotReady { item_id }) => assert_eq!(item_id, "i1"),
            other => panic!("expected ContentNotReady, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_blank_locator_counts_as_missing() {
        let content =
            LazyContent::deferred("i1", Some("  ".to_string()), ContentFetcher::default());
        assert!(content.locator().is_none());
        assert!(matches!(
            content.get().await,
            Err(WebCrawlerError::ContentNotReady { .. })
        ));
    }

    #[tokio::test]
    async fn test_empty_inline_body_is_not_not_ready() {
        let content = LazyContent::inline("s1", String::new(), ContentFetcher::default());
        assert_eq!(content.get().await.unwrap(), "");
    }
}
