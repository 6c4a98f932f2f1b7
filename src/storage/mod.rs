//! Object store layer.
//!
//! Handlers download files through a [`StorageGateway`], which knows the
//! configured bucket and URL lifetime, and delegates to an [`ObjectStore`].

mod s3;

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use serde::Serialize;

use crate::config::{DEFAULT_PRESIGN_TTL_SECS, MISSING_BUCKET_CONFIG};
use crate::error::ApiError;

pub use s3::{create_s3_client, S3ObjectStore};

/// A time-limited URL for downloading an object directly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PresignedUrl {
    #[serde(rename = "URL")]
    pub url: String,

    #[serde(rename = "Method")]
    pub method: String,

    /// Headers the client must send along with the request
    #[serde(rename = "SignedHeader")]
    pub signed_header: BTreeMap<String, Vec<String>>,

    /// Unix timestamp (seconds) after which the URL is rejected
    #[serde(rename = "ExpiresAt")]
    pub expires_at: u64,
}

/// Access to a managed object store.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Read the whole object.
    ///
    /// Implementations must read the body to end-of-stream rather than trust
    /// a single read to return `Content-Length` bytes.
    async fn fetch(&self, bucket: &str, key: &str) -> Result<Bytes, ApiError>;

    /// Produce a pre-signed GET URL valid for `ttl`.
    async fn presign_get(
        &self,
        bucket: &str,
        key: &str,
        ttl: Duration,
    ) -> Result<PresignedUrl, ApiError>;
}

/// Bucket-scoped view of the object store.
#[derive(Clone)]
pub struct StorageGateway {
    store: Arc<dyn ObjectStore>,
    bucket: Option<String>,
    presign_ttl: Duration,
}

impl fmt::Debug for StorageGateway {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StorageGateway")
            .field("bucket", &self.bucket)
            .field("presign_ttl", &self.presign_ttl)
            .finish()
    }
}

impl StorageGateway {
    /// Create a gateway. A `None` bucket makes every call fail with a
    /// configuration error.
    pub fn new(store: Arc<dyn ObjectStore>, bucket: Option<String>) -> Self {
        Self {
            store,
            bucket,
            presign_ttl: Duration::from_secs(DEFAULT_PRESIGN_TTL_SECS),
        }
    }

    pub fn with_presign_ttl(mut self, ttl: Duration) -> Self {
        self.presign_ttl = ttl;
        self
    }

    pub fn bucket(&self) -> Result<&str, ApiError> {
        self.bucket
            .as_deref()
            .ok_or_else(|| ApiError::Config(MISSING_BUCKET_CONFIG.to_string()))
    }

    pub fn presign_ttl(&self) -> Duration {
        self.presign_ttl
    }

    pub async fn fetch(&self, key: &str) -> Result<Bytes, ApiError> {
        let bucket = self.bucket()?;
        self.store.fetch(bucket, key).await
    }

    pub async fn presign(&self, key: &str) -> Result<PresignedUrl, ApiError> {
        let bucket = self.bucket()?;
        self.store.presign_get(bucket, key, self.presign_ttl).await
    }
}
