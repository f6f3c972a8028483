//! Cloudflare R2 (S3-compatible) snapshot storage.

use std::fmt;

use async_trait::async_trait;
use aws_credential_types::Credentials;
use aws_sdk_s3::error::{DisplayErrorContext, ProvideErrorMetadata};
use aws_sdk_s3::operation::get_object::GetObjectError;
use aws_sdk_s3::{primitives::ByteStream, Client};
use aws_types::region::Region;

use super::{SnapshotKey, SnapshotStore};
use crate::{Error, Result};

const SNAPSHOT_EXTENSION: &str = ".json";
const SNAPSHOT_CONTENT_TYPE: &str = "application/json";
const CONDITIONAL_WRITE_CODES: [&str; 2] = ["PreconditionFailed", "ConditionalRequestConflict"];

/// Cloudflare R2 configuration.
#[derive(Clone, PartialEq, Eq)]
pub struct R2Config {
    /// Cloudflare account identifier.
    pub account_id: String,
    /// Destination bucket (container) name.
    pub bucket: String,
    /// Access key id for S3-compatible auth.
    pub access_key_id: String,
    /// Secret access key for S3-compatible auth.
    pub secret_access_key: String,
    /// Explicit S3 endpoint, replacing the account-derived R2 endpoint.
    pub endpoint_url: Option<String>,
    /// Prefix prepended to every object key, e.g. `posts/`.
    pub key_prefix: Option<String>,
}

impl fmt::Debug for R2Config {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("R2Config")
            .field("account_id", &self.account_id)
            .field("bucket", &self.bucket)
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &"[REDACTED]")
            .field("endpoint_url", &self.endpoint_url)
            .field("key_prefix", &self.key_prefix)
            .finish()
    }
}

impl R2Config {
    /// S3-compatible endpoint URL.
    #[must_use]
    pub fn endpoint_url(&self) -> String {
        self.endpoint_url.as_ref().map_or_else(
            || format!("https://{}.r2.cloudflarestorage.com", self.account_id),
            |url| url.trim_end_matches('/').to_string(),
        )
    }
}

/// R2-backed snapshot store.
///
/// Holds one S3 client for its whole lifetime.
#[derive(Clone)]
pub struct R2Storage {
    config: R2Config,
    client: Client,
}

impl fmt::Debug for R2Storage {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("R2Storage")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl R2Storage {
    #[must_use]
    pub fn new(config: R2Config) -> Self {
        let client = build_s3_client(&config);
        Self { config, client }
    }

    #[must_use]
    pub const fn config(&self) -> &R2Config {
        &self.config
    }

    /// Check that the configured bucket is reachable with current credentials.
    pub async fn bucket_is_reachable(&self) -> Result<()> {
        self.client
            .head_bucket()
            .bucket(&self.config.bucket)
            .send()
            .await
            .map_err(|error| storage_error("head_bucket", &self.config.bucket, None, &error))?;
        Ok(())
    }

    /// Object key for a snapshot: `{prefix}{key}.json`.
    pub fn object_key(&self, key: &SnapshotKey) -> Result<String> {
        let prefix = normalize_key_prefix(self.config.key_prefix.as_deref());
        normalize_object_key(&format!("{prefix}{key}{SNAPSHOT_EXTENSION}"))
    }
}

#[async_trait]
impl SnapshotStore for R2Storage {
    async fn exists(&self, key: &SnapshotKey) -> Result<bool> {
        let object_key = self.object_key(key)?;

        let response = self
            .client
            .list_objects_v2()
            .bucket(&self.config.bucket)
            .prefix(&object_key)
            .max_keys(1)
            .send()
            .await
            .map_err(|error| {
                storage_error(
                    "list_objects_v2",
                    &self.config.bucket,
                    Some(&object_key),
                    &error,
                )
            })?;

        Ok(response
            .contents()
            .iter()
            .filter_map(|object| object.key())
            .any(|candidate| candidate == object_key))
    }

    async fn read(&self, key: &SnapshotKey) -> Result<Vec<u8>> {
        let object_key = self.object_key(key)?;

        let response = match self
            .client
            .get_object()
            .bucket(&self.config.bucket)
            .key(&object_key)
            .send()
            .await
        {
            Ok(response) => response,
            Err(error) => {
                if matches!(error.as_service_error(), Some(GetObjectError::NoSuchKey(_))) {
                    return Err(Error::NotFound(object_key));
                }
                return Err(storage_error(
                    "get_object",
                    &self.config.bucket,
                    Some(&object_key),
                    &error,
                ));
            }
        };

        let payload = response.body.collect().await.map_err(|error| {
            storage_error(
                "get_object_body",
                &self.config.bucket,
                Some(&object_key),
                &error,
            )
        })?;

        Ok(payload.into_bytes().to_vec())
    }

    async fn write(&self, key: &SnapshotKey, bytes: &[u8], overwrite: bool) -> Result<()> {
        let object_key = self.object_key(key)?;

        let mut request = self
            .client
            .put_object()
            .bucket(&self.config.bucket)
            .key(&object_key)
            .content_type(SNAPSHOT_CONTENT_TYPE)
            .body(ByteStream::from(bytes.to_vec()));

        if !overwrite {
            request = request.if_none_match("*");
        }

        request.send().await.map_err(|error| {
            let code = error.as_service_error().and_then(ProvideErrorMetadata::code);
            if code.is_some_and(|code| CONDITIONAL_WRITE_CODES.contains(&code)) {
                Error::Conflict(object_key.clone())
            } else {
                storage_error("put_object", &self.config.bucket, Some(&object_key), &error)
            }
        })?;

        Ok(())
    }
}

fn build_s3_client(config: &R2Config) -> Client {
    let credentials = Credentials::new(
        config.access_key_id.clone(),
        config.secret_access_key.clone(),
        None,
        None,
        "wpmirror-r2-storage",
    );

    let sdk_config = aws_sdk_s3::config::Builder::new()
        .region(Region::new("auto"))
        .credentials_provider(credentials)
        .endpoint_url(config.endpoint_url())
        .force_path_style(true)
        .build();

    Client::from_conf(sdk_config)
}

fn storage_error(
    operation: &str,
    bucket: &str,
    object_key: Option<&str>,
    error: &(dyn std::error::Error + 'static),
) -> Error {
    let target = object_key.map_or_else(|| bucket.to_string(), |key| format!("{bucket}/{key}"));
    Error::StoreUnavailable(format!(
        "R2 {operation} failed for {target}: {}",
        DisplayErrorContext(error)
    ))
}

fn normalize_object_key(object_key: &str) -> Result<String> {
    let object_key = object_key.trim().trim_matches('/').to_string();
    if object_key.is_empty() {
        return Err(Error::InvalidInput(
            "Snapshot object_key cannot be empty".to_string(),
        ));
    }
    Ok(object_key)
}

fn normalize_key_prefix(prefix: Option<&str>) -> String {
    let prefix = prefix.map_or("", |value| value.trim().trim_matches('/'));
    if prefix.is_empty() {
        String::new()
    } else {
        format!("{prefix}/")
    }
}

#[cfg(test)]
mod tests {
    use std::env;

    use super::*;
    use crate::models::PostId;

    fn test_config() -> R2Config {
        R2Config {
            account_id: "account-1".to_string(),
            bucket: "wp-posts".to_string(),
            access_key_id: "AKID123".to_string(),
            secret_access_key: "SECRET123".to_string(),
            endpoint_url: None,
            key_prefix: None,
        }
    }

    fn key(id: i64) -> SnapshotKey {
        SnapshotKey::for_post(PostId::new(id))
    }

    #[test]
    fn endpoint_url_defaults_to_account_endpoint() {
        assert_eq!(
            test_config().endpoint_url(),
            "https://account-1.r2.cloudflarestorage.com"
        );
    }

    #[test]
    fn endpoint_url_prefers_override() {
        let config = R2Config {
            endpoint_url: Some("http://localhost:9000/".to_string()),
            ..test_config()
        };
        assert_eq!(config.endpoint_url(), "http://localhost:9000");
    }

    #[test]
    fn object_key_appends_json_extension() {
        let storage = R2Storage::new(test_config());
        assert_eq!(storage.object_key(&key(42)).unwrap(), "42.json");
    }

    #[test]
    fn object_key_normalizes_prefix() {
        for prefix in ["posts", "/posts/", " posts/ "] {
            let storage = R2Storage::new(R2Config {
                key_prefix: Some(prefix.to_string()),
                ..test_config()
            });
            assert_eq!(storage.object_key(&key(7)).unwrap(), "posts/7.json");
        }
    }

    #[test]
    fn normalize_object_key_rejects_empty() {
        let err = normalize_object_key("  / ").unwrap_err();
        match err {
            Error::InvalidInput(message) => assert!(message.contains("object_key")),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn debug_redacts_secret() {
        let debug = format!("{:?}", R2Storage::new(test_config()));
        assert!(!debug.contains("SECRET123"));
        assert!(debug.contains("[REDACTED]"));
    }

    fn config_from_env() -> R2Config {
        let _ = dotenvy::dotenv();
        let var = |name: &str| env::var(name).unwrap_or_else(|_| panic!("{name} should be set"));
        R2Config {
            account_id: var("R2_ACCOUNT_ID"),
            bucket: var("BLOB_CONTAINER"),
            access_key_id: var("R2_ACCESS_KEY_ID"),
            secret_access_key: var("R2_SECRET_ACCESS_KEY"),
            endpoint_url: env::var("R2_ENDPOINT_URL").ok(),
            key_prefix: Some("wpmirror-integration".to_string()),
        }
    }

    #[tokio::test(flavor = "multi_thread")]
    #[ignore = "Requires R2 env vars plus network access"]
    async fn r2_bucket_exists_and_is_reachable() {
        let storage = R2Storage::new(config_from_env());
        storage.bucket_is_reachable().await.unwrap_or_else(|error| {
            panic!(
                "R2 bucket health check failed for bucket '{}': {error}",
                storage.config().bucket
            )
        });
    }

    #[tokio::test(flavor = "multi_thread")]
    #[ignore = "Requires R2 env vars plus network access"]
    async fn r2_snapshot_roundtrip_write_exists_read() {
        let storage = R2Storage::new(config_from_env());
        let key = SnapshotKey::for_post(PostId::new(chrono::Utc::now().timestamp_millis()));

        assert!(matches!(storage.read(&key).await, Err(Error::NotFound(_))));

        storage
            .write(&key, br#"{"id":1}"#, false)
            .await
            .unwrap_or_else(|error| panic!("R2 create failed: {error}"));
        assert!(storage.exists(&key).await.unwrap());
        assert!(matches!(
            storage.write(&key, br#"{"id":1}"#, false).await,
            Err(Error::Conflict(_))
        ));

        storage.write(&key, br#"{"id":2}"#, true).await.unwrap();
        assert_eq!(storage.read(&key).await.unwrap(), br#"{"id":2}"#.to_vec());
    }
}
