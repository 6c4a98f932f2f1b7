use std::collections::BTreeMap;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
use aws_config::retry::RetryConfig;
use aws_sdk_s3::presigning::PresigningConfig;
use aws_sdk_s3::Client;
use bytes::Bytes;
use tracing::debug;

use super::{ObjectStore, PresignedUrl};
use crate::error::{upstream_error, ApiError};

/// S3-backed implementation of [`ObjectStore`].
///
/// Works with AWS S3 and S3-compatible services (MinIO, etc.).
#[derive(Clone, Debug)]
pub struct S3ObjectStore {
    client: Client,
}

impl S3ObjectStore {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ObjectStore for S3ObjectStore {
    async fn fetch(&self, bucket: &str, key: &str) -> Result<Bytes, ApiError> {
        let resp = self
            .client
            .get_object()
            .bucket(bucket)
            .key(key)
            .send()
            .await
            .map_err(upstream_error)?;

        debug!(
            bucket = bucket,
            key = key,
            content_length = resp.content_length().unwrap_or(-1),
            "Fetching object"
        );

        // Drain the stream; a single read may return fewer bytes than Content-Length.
        let data = resp
            .body
            .collect()
            .await
            .map_err(|e| ApiError::upstream(format!("failed to read s3://{}/{}: {}", bucket, key, e)))?
            .into_bytes();

        Ok(data)
    }

    async fn presign_get(
        &self,
        bucket: &str,
        key: &str,
        ttl: Duration,
    ) -> Result<PresignedUrl, ApiError> {
        let start_time = SystemTime::now();
        let presigning = PresigningConfig::builder()
            .start_time(start_time)
            .expires_in(ttl)
            .build()
            .map_err(|e| ApiError::Config(format!("invalid presign ttl: {}", e)))?;

        let request = self
            .client
            .get_object()
            .bucket(bucket)
            .key(key)
            .presigned(presigning)
            .await
            .map_err(upstream_error)?;

        let mut signed_header: BTreeMap<String, Vec<String>> = BTreeMap::new();
        for (name, value) in request.headers() {
            signed_header
                .entry(name.to_string())
                .or_default()
                .push(value.to_string());
        }

        let issued_at = start_time
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0);

        Ok(PresignedUrl {
            url: request.uri().to_string(),
            method: request.method().to_string(),
            signed_header,
            expires_at: issued_at + ttl.as_secs(),
        })
    }
}

/// Create an S3 client with optional custom endpoint and region.
///
/// Use a custom endpoint for S3-compatible services like MinIO:
/// ```ignore
/// let client = create_s3_client(Some("http://localhost:9000"), Some("us-east-1")).await;
/// ```
///
/// With `None` for both, the default AWS endpoint and the region from the
/// environment are used. Retries are disabled.
pub async fn create_s3_client(endpoint_url: Option<&str>, region: Option<&str>) -> Client {
    let mut config_loader = aws_config::defaults(aws_config::BehaviorVersion::latest())
        .retry_config(RetryConfig::disabled());

    if let Some(region) = region {
        config_loader = config_loader.region(aws_config::Region::new(region.to_string()));
    }

    if let Some(endpoint) = endpoint_url {
        config_loader = config_loader.endpoint_url(endpoint);
    }

    let sdk_config = config_loader.load().await;

    // For S3-compatible services, we often need to use path-style addressing
    let s3_config = if endpoint_url.is_some() {
        aws_sdk_s3::config::Builder::from(&sdk_config)
            .force_path_style(true)
            .build()
    } else {
        aws_sdk_s3::config::Builder::from(&sdk_config).build()
    };

    Client::from_conf(s3_config)
}
