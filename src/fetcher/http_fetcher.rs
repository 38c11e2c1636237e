use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ETAG, IF_MODIFIED_SINCE, IF_NONE_MATCH, LAST_MODIFIED};
use reqwest::{Client, StatusCode};

use crate::app::{AppError, Result};
use crate::config::FetchConfig;
use crate::fetcher::{FetchResult, Fetcher, Validators};

pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new(config: &FetchConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .gzip(true)
            .brotli(true)
            .user_agent(config.user_agent.as_str())
            .build()?;

        Ok(Self { client })
    }

    fn conditional_headers(validators: &Validators) -> HeaderMap {
        let mut headers = HeaderMap::new();

        if let Some(value) = validators
            .etag
            .as_deref()
            .and_then(|v| HeaderValue::from_str(v).ok())
        {
            headers.insert(IF_NONE_MATCH, value);
        }
        if let Some(value) = validators
            .last_modified
            .as_deref()
            .and_then(|v| HeaderValue::from_str(v).ok())
        {
            headers.insert(IF_MODIFIED_SINCE, value);
        }

        headers
    }
}

fn header(headers: &HeaderMap, name: reqwest::header::HeaderName) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(String::from)
}

fn fetch_failed(url: &str, err: reqwest::Error) -> AppError {
    let reason = if err.is_timeout() {
        "request timed out".to_string()
    } else {
        err.to_string()
    };
    AppError::FetchFailed {
        url: url.to_string(),
        reason,
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, url: &str, validators: &Validators) -> Result<FetchResult> {
        tracing::debug!("Fetching {}", url);
        let response = self
            .client
            .get(url)
            .headers(Self::conditional_headers(validators))
            .send()
            .await
            .map_err(|e| fetch_failed(url, e))?;

        if response.status() == StatusCode::NOT_MODIFIED {
            return Ok(FetchResult::NotModified);
        }

        if !response.status().is_success() {
            return Err(AppError::FetchFailed {
                url: url.to_string(),
                reason: format!("HTTP {}", response.status()),
            });
        }

        let validators = Validators {
            etag: header(response.headers(), ETAG),
            last_modified: header(response.headers(), LAST_MODIFIED),
        };
        let body = response
            .bytes()
            .await
            .map_err(|e| fetch_failed(url, e))?
            .to_vec();

        Ok(FetchResult::Fetched { body, validators })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_conditional_headers() {
        let validators = Validators {
            etag: Some("\"abc\"".into()),
            last_modified: Some("Mon, 01 Jan 2024 00:00:00 GMT".into()),
        };
        let headers = HttpFetcher::conditional_headers(&validators);
        assert_eq!(headers.get(IF_NONE_MATCH).unwrap(), "\"abc\"");
        assert_eq!(
            headers.get(IF_MODIFIED_SINCE).unwrap(),
            "Mon, 01 Jan 2024 00:00:00 GMT"
        );
        assert!(HttpFetcher::conditional_headers(&Validators::none()).is_empty());
    }

    #[test]
    fn test_invalid_header_values_are_skipped() {
        let validators = Validators {
            etag: Some("bad\nvalue".into()),
            last_modified: None,
        };
        assert!(HttpFetcher::conditional_headers(&validators).is_empty());
    }

    #[test]
    fn test_builds_from_config() {
        assert!(HttpFetcher::new(&FetchConfig::default()).is_ok());
    }
}
