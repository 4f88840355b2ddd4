//! Page retrieval for the discovery pipeline.
//!
//! Fetching never fails outward: a page that cannot be retrieved becomes an
//! empty string, which in turn yields an empty extraction.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{header, Client};

use crate::error::DiscoveryError;

pub(crate) const BROWSER_USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36";

const BROWSER_ACCEPT: &str = "text/html,application/xhtml+xml,application/xml;q=0.9,image/webp,*/*;q=0.8";

/// Source of raw page markup.
#[async_trait]
pub trait PageSource: Send + Sync {
    /// Returns the page body, or an empty string if it could not be retrieved.
    async fn fetch(&self, url: &str) -> String;
}

/// [`PageSource`] backed by `reqwest` with a browser-like request profile.
pub struct HttpPageFetcher {
    client: Client,
}

impl HttpPageFetcher {
    /// Creates a fetcher whose requests are bounded by `timeout_secs` of
    /// wall-clock time.
    ///
    /// # Errors
    ///
    /// Returns [`DiscoveryError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed.
    pub fn new(timeout_secs: u64) -> Result<Self, DiscoveryError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(BROWSER_USER_AGENT)
            .build()?;
        Ok(Self { client })
    }

    async fn try_fetch(&self, url: &str) -> Result<String, DiscoveryError> {
        let response = self
            .client
            .get(url)
            .header(header::ACCEPT, BROWSER_ACCEPT)
            .header(header::ACCEPT_LANGUAGE, "en-US,en;q=0.5")
            .header(header::CONNECTION, "keep-alive")
            .header(header::UPGRADE_INSECURE_REQUESTS, "1")
            .send()
            .await?
            .error_for_status()?;
        Ok(response.text().await?)
    }
}

#[async_trait]
impl PageSource for HttpPageFetcher {
    async fn fetch(&self, url: &str) -> String {
        if url.is_empty() {
            return String::new();
        }
        match self.try_fetch(url).await {
            Ok(html) => {
                tracing::debug!(url, bytes = html.len(), "fetched page");
                html
            }
            Err(e) => {
                tracing::warn!(url, error = %e, "failed to fetch page HTML");
                String::new()
            }
        }
    }
}
