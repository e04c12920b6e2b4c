//! The `Fetcher` seam between scrapers and the network.

use async_trait::async_trait;
use reqwest::header::HeaderMap;

use crate::error::Result;

/// A single GET request with its header set.
#[derive(Debug, Clone)]
pub struct PageRequest {
    /// Absolute URL to fetch
    pub url: String,
    /// Headers to send
    pub headers: HeaderMap,
}

impl PageRequest {
    /// Create a request for `url` with the given headers.
    #[must_use]
    pub fn new(url: impl Into<String>, headers: HeaderMap) -> Self {
        Self {
            url: url.into(),
            headers,
        }
    }
}

/// A response whose body has already been read and decompressed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedPage {
    /// HTTP status code
    pub status: u16,
    /// Decoded body text
    pub body: String,
}

impl FetchedPage {
    /// Create a page from a status and body.
    #[must_use]
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    /// Whether the status is in the 2xx range.
    #[must_use]
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Performs GET requests.
///
/// Non-2xx statuses are returned as pages, not errors; only transport
/// failures surface as [`crate::HttpError`].
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Fetch a page.
    async fn fetch(&self, request: &PageRequest) -> Result<FetchedPage>;
}
