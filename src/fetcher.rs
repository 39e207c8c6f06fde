//! Public IP lookup.

use crate::error::{MailerError, Result};
use async_trait::async_trait;

/// Something that can tell us the current public address.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AddressSource: Send + Sync {
    /// Fetch the current public address as the service reports it.
    async fn fetch_current_address(&self) -> Result<String>;
}

/// Fetches the public address from a plain-text IP-echo service.
pub struct IpFetcher {
    client: reqwest::Client,
    url: String,
}

impl IpFetcher {
    /// Create a fetcher for the given IP-echo URL.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            url: url.into(),
        }
    }

    /// The endpoint queried.
    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl AddressSource for IpFetcher {
    async fn fetch_current_address(&self) -> Result<String> {
        let response = self
            .client
            .get(&self.url)
            .send()
            .await
            .map_err(|e| MailerError::Network(format!("request to {} failed: {}", self.url, e)))?;

        if !response.status().is_success() {
            return Err(MailerError::Network(format!(
                "HTTP {} from {}",
                response.status(),
                self.url
            )));
        }

        // Whitespace from the service is kept. Invalid UTF-8 is replaced the
        // same way the cache decodes, so both sides compare consistently.
        let bytes = response.bytes().await.map_err(|e| {
            MailerError::Network(format!("failed reading body from {}: {}", self.url, e))
        })?;
        let body = String::from_utf8_lossy(&bytes).into_owned();
        tracing::debug!("Fetched {:?} from {}", body, self.url);
        Ok(body)
    }
}
