//! Runtime configuration for a mirror deployment.
//!
//! Everything a sync cycle needs from its environment is resolved once into a
//! [`MirrorConfig`] value and passed to the runner at construction time.

use std::collections::HashMap;
use std::env;
use std::fmt;
use std::time::Duration;

use crate::storage::R2Config;
use crate::util::{is_http_url, normalize_text_option};
use crate::{Error, Result};

const ENV_SOURCE_URL: &str = "WP_BLOG_API_URL";
const ENV_CONTAINER: &str = "BLOB_CONTAINER";
const ENV_ACCOUNT_ID: &str = "R2_ACCOUNT_ID";
const ENV_ACCESS_KEY_ID: &str = "R2_ACCESS_KEY_ID";
const ENV_SECRET_ACCESS_KEY: &str = "R2_SECRET_ACCESS_KEY";
const ENV_ENDPOINT_URL: &str = "R2_ENDPOINT_URL";
const ENV_KEY_PREFIX: &str = "BLOB_KEY_PREFIX";
const ENV_REQUEST_TIMEOUT_SECS: &str = "WP_REQUEST_TIMEOUT_SECS";

const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Credentials for the snapshot store.
#[derive(Clone, PartialEq, Eq)]
pub struct StorageCredential {
    pub account_id: String,
    pub access_key_id: String,
    pub secret_access_key: String,
}

impl fmt::Debug for StorageCredential {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("StorageCredential")
            .field("account_id", &self.account_id)
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &"[REDACTED]")
            .finish()
    }
}

/// Resolved configuration for one mirror.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MirrorConfig {
    /// Posts endpoint, e.g. `https://blog.example.com/wp-json/wp/v2/posts`.
    pub source_url: String,
    /// Destination bucket/container.
    pub container: String,
    pub credential: StorageCredential,
    /// Explicit S3 endpoint (MinIO, other S3-compatible stores).
    pub storage_endpoint_url: Option<String>,
    /// Prefix for every stored object key.
    pub key_prefix: Option<String>,
    /// Timeout for the source request.
    pub request_timeout: Duration,
}

impl MirrorConfig {
    /// Load configuration from process environment variables.
    pub fn from_env() -> Result<Self> {
        let values: HashMap<String, String> = env::vars().collect();
        Self::from_lookup(|name| values.get(name).cloned())
    }

    /// Load configuration from an arbitrary variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let source_url = optional_trimmed(&lookup, ENV_SOURCE_URL);
        let container = optional_trimmed(&lookup, ENV_CONTAINER);
        let account_id = optional_trimmed(&lookup, ENV_ACCOUNT_ID);
        let access_key_id = optional_trimmed(&lookup, ENV_ACCESS_KEY_ID);
        let secret_access_key = optional_trimmed(&lookup, ENV_SECRET_ACCESS_KEY);

        let mut missing = Vec::new();
        for (name, value) in [
            (ENV_SOURCE_URL, &source_url),
            (ENV_CONTAINER, &container),
            (ENV_ACCOUNT_ID, &account_id),
            (ENV_ACCESS_KEY_ID, &access_key_id),
            (ENV_SECRET_ACCESS_KEY, &secret_access_key),
        ] {
            if value.is_none() {
                missing.push(name);
            }
        }
        if !missing.is_empty() {
            return Err(Error::InvalidInput(format!(
                "Mirror configuration is incomplete. Missing: {}",
                missing.join(", ")
            )));
        }

        let source_url = source_url.expect("validated above");
        let container = container.expect("validated above");
        let credential = StorageCredential {
            account_id: account_id.expect("validated above"),
            access_key_id: access_key_id.expect("validated above"),
            secret_access_key: secret_access_key.expect("validated above"),
        };

        if !is_http_url(&source_url) {
            return Err(Error::InvalidInput(format!(
                "{ENV_SOURCE_URL} must start with http:// or https://"
            )));
        }

        let storage_endpoint_url = optional_trimmed(&lookup, ENV_ENDPOINT_URL);
        if let Some(url) = storage_endpoint_url.as_deref() {
            if !is_http_url(url) {
                return Err(Error::InvalidInput(format!(
                    "{ENV_ENDPOINT_URL} must start with http:// or https://"
                )));
            }
        }

        let request_timeout_secs = optional_trimmed(&lookup, ENV_REQUEST_TIMEOUT_SECS)
            .map_or(Ok(DEFAULT_REQUEST_TIMEOUT_SECS), |value| {
                value.parse::<u64>().map_err(|_| {
                    Error::InvalidInput(format!(
                        "{ENV_REQUEST_TIMEOUT_SECS} must be an integer in [1, 300]"
                    ))
                })
            })?;
        if !(1..=300).contains(&request_timeout_secs) {
            return Err(Error::InvalidInput(format!(
                "{ENV_REQUEST_TIMEOUT_SECS} must be in [1, 300]"
            )));
        }

        Ok(Self {
            source_url,
            container,
            credential,
            storage_endpoint_url,
            key_prefix: optional_trimmed(&lookup, ENV_KEY_PREFIX),
            request_timeout: Duration::from_secs(request_timeout_secs),
        })
    }

    /// Storage backend configuration derived from this mirror.
    #[must_use]
    pub fn r2_config(&self) -> R2Config {
        R2Config {
            account_id: self.credential.account_id.clone(),
            bucket: self.container.clone(),
            access_key_id: self.credential.access_key_id.clone(),
            secret_access_key: self.credential.secret_access_key.clone(),
            endpoint_url: self.storage_endpoint_url.clone(),
            key_prefix: self.key_prefix.clone(),
        }
    }
}

fn optional_trimmed(lookup: impl Fn(&str) -> Option<String>, name: &str) -> Option<String> {
    normalize_text_option(lookup(name))
}
