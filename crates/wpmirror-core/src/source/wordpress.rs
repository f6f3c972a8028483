//! WordPress REST post source.

use std::time::Duration;

use async_trait::async_trait;

use super::{parse_posts, FetchedPosts, PostSource};
use crate::util::{compact_text, is_http_url, normalize_text_option};
use crate::{Error, Result};

/// HTTP client for a WordPress-style posts endpoint.
///
/// Owns its `reqwest::Client`; build one per process and reuse it across
/// cycles so connections are pooled.
#[derive(Debug, Clone)]
pub struct WordPressClient {
    endpoint: String,
    client: reqwest::Client,
}

impl WordPressClient {
    /// Builds a client with its own connection pool and request timeout.
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|error| {
                Error::InvalidInput(format!("Failed to construct HTTP client: {error}"))
            })?;
        Self::with_client(endpoint, client)
    }

    /// Builds a source around a caller-provided HTTP client.
    pub fn with_client(endpoint: impl Into<String>, client: reqwest::Client) -> Result<Self> {
        let endpoint = normalize_endpoint(endpoint.into())?;
        Ok(Self { endpoint, client })
    }

    /// Returns the endpoint this client was configured with.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl PostSource for WordPressClient {
    async fn fetch_posts(&self) -> Result<FetchedPosts> {
        let response = self
            .client
            .get(&self.endpoint)
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await
            .map_err(|error| Error::Fetch(format!("GET {} failed: {error}", self.endpoint)))?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Fetch(format!(
                "{} returned HTTP {status}: {}",
                self.endpoint,
                compact_text(&body)
            )));
        }

        let body = response
            .text()
            .await
            .map_err(|error| Error::Fetch(format!("failed to read response body: {error}")))?;
        parse_posts(&body)
    }
}

fn normalize_endpoint(raw: String) -> Result<String> {
    let endpoint = normalize_text_option(Some(raw))
        .ok_or_else(|| Error::InvalidInput("Source endpoint must not be empty".to_string()))?;
    if is_http_url(&endpoint) {
        Ok(endpoint)
    } else {
        Err(Error::InvalidInput(
            "Source endpoint must include http:// or https://".to_string(),
        ))
    }
}
