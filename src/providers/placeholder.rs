//! Last-resort stock image source.
//!
//! An unauthenticated GET against a public image service (grayscale, so a
//! filler page at least looks intentional next to line art). This is only
//! ever called after both render attempts for a slot have failed; if this
//! fails too, the run is over — see
//! [`crate::error::BookError::PlaceholderUnavailable`].

use crate::error::ServiceError;
use crate::providers::PlaceholderSource;
use async_trait::async_trait;
use std::time::Duration;
use tracing::debug;

/// Fetches the generic filler image over plain HTTP GET.
pub struct StockImageSource {
    http: reqwest::Client,
    url: String,
    timeout_secs: u64,
}

impl StockImageSource {
    pub fn new(url: &str, timeout_secs: u64) -> Result<Self, ServiceError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| ServiceError::Network(e.to_string()))?;

        Ok(Self {
            http,
            url: url.to_string(),
            timeout_secs,
        })
    }
}

#[async_trait]
impl PlaceholderSource for StockImageSource {
    async fn fetch(&self) -> Result<Vec<u8>, ServiceError> {
        let response = self
            .http
            .get(&self.url)
            .send()
            .await
            .map_err(|e| ServiceError::from_reqwest(e, self.timeout_secs))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ServiceError::Http {
                status: status.as_u16(),
            });
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| ServiceError::from_reqwest(e, self.timeout_secs))?;

        if bytes.is_empty() {
            return Err(ServiceError::BadResponse("empty placeholder body".into()));
        }

        debug!("Placeholder source returned {} bytes", bytes.len());
        Ok(bytes.to_vec())
    }

    fn url(&self) -> &str {
        &self.url
    }
}
