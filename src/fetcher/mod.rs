pub mod http_fetcher;

use async_trait::async_trait;

use crate::app::Result;
use crate::domain::Feed;

pub use http_fetcher::HttpFetcher;

/// Cache validators from a previous fetch, sent as conditional headers.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Validators {
    pub etag: Option<String>,
    pub last_modified: Option<String>,
}

impl Validators {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn from_feed(feed: &Feed) -> Self {
        Self {
            etag: feed.etag.clone(),
            last_modified: feed.last_modified.clone(),
        }
    }
}

#[derive(Debug)]
pub enum FetchResult {
    /// Feed document body with the validators the server returned
    Fetched { body: Vec<u8>, validators: Validators },
    /// Server answered 304 Not Modified
    NotModified,
}

/// Retrieves raw feed documents. The seam for swapping in test doubles.
#[async_trait]
pub trait Fetcher {
    async fn fetch(&self, url: &str, validators: &Validators) -> Result<FetchResult>;
}
