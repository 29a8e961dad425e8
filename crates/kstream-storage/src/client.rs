//! S3-compatible blob client.
//!
//! Subtitle files and artwork are written to an S3-compatible bucket
//! (Cloudflare R2 in production). Uploaded objects must end up publicly
//! fetchable: the video host pulls subtitle tracks by URL when they are
//! registered, so [`BlobClient::public_url`] either joins the configured
//! public base URL or falls back to a long-lived presigned URL.

use std::time::Duration;

use aws_config::BehaviorVersion;
use aws_credential_types::Credentials;
use aws_sdk_s3::config::{Builder, Region};
use aws_sdk_s3::presigning::PresigningConfig;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client;
use tracing::{debug, info};

use crate::error::{StorageError, StorageResult};

/// Presign lifetime used when no public base URL is configured (7 days,
/// the S3 SigV4 maximum).
const PRESIGN_FALLBACK_TTL: Duration = Duration::from_secs(7 * 24 * 60 * 60);

/// Configuration for the blob client.
#[derive(Debug, Clone)]
pub struct BlobConfig {
    /// S3 API endpoint URL
    pub endpoint_url: String,
    /// Access key ID
    pub access_key_id: String,
    /// Secret access key
    pub secret_access_key: String,
    /// Bucket name
    pub bucket_name: String,
    /// Region (usually "auto" for R2)
    pub region: String,
    /// Public base URL the bucket is served from, if any
    pub public_base_url: Option<String>,
}

impl BlobConfig {
    /// Create config from environment variables.
    pub fn from_env() -> StorageResult<Self> {
        Ok(Self {
            endpoint_url: std::env::var("BLOB_ENDPOINT_URL")
                .map_err(|_| StorageError::config_error("BLOB_ENDPOINT_URL not set"))?,
            access_key_id: std::env::var("BLOB_ACCESS_KEY_ID")
                .map_err(|_| StorageError::config_error("BLOB_ACCESS_KEY_ID not set"))?,
            secret_access_key: std::env::var("BLOB_SECRET_ACCESS_KEY")
                .map_err(|_| StorageError::config_error("BLOB_SECRET_ACCESS_KEY not set"))?,
            bucket_name: std::env::var("BLOB_BUCKET_NAME")
                .map_err(|_| StorageError::config_error("BLOB_BUCKET_NAME not set"))?,
            region: std::env::var("BLOB_REGION").unwrap_or_else(|_| "auto".to_string()),
            public_base_url: std::env::var("BLOB_PUBLIC_BASE_URL")
                .ok()
                .map(|u| u.trim_end_matches('/').to_string())
                .filter(|u| !u.is_empty()),
        })
    }
}

/// S3-compatible blob storage client.
#[derive(Clone)]
pub struct BlobClient {
    client: Client,
    bucket: String,
    public_base_url: Option<String>,
}

impl BlobClient {
    /// Create a new blob client from configuration.
    pub async fn new(config: BlobConfig) -> StorageResult<Self> {
        let credentials = Credentials::new(
            &config.access_key_id,
            &config.secret_access_key,
            None,
            None,
            "blob",
        );

        let sdk_config = Builder::new()
            .behavior_version(BehaviorVersion::latest())
            .endpoint_url(&config.endpoint_url)
            .region(Region::new(config.region))
            .credentials_provider(credentials)
            .force_path_style(true)
            .build();

        let client = Client::from_conf(sdk_config);

        Ok(Self {
            client,
            bucket: config.bucket_name,
            public_base_url: config.public_base_url,
        })
    }

    /// Create from environment variables.
    pub async fn from_env() -> StorageResult<Self> {
        let config = BlobConfig::from_env()?;
        Self::new(config).await
    }

    /// Upload bytes under a key.
    pub async fn upload_bytes(
        &self,
        data: Vec<u8>,
        key: &str,
        content_type: &str,
    ) -> StorageResult<()> {
        debug!("Uploading {} bytes to {}", data.len(), key);

        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .body(ByteStream::from(data))
            .content_type(content_type)
            .send()
            .await
            .map_err(|e| StorageError::upload_failed(e.to_string()))?;

        info!("Uploaded blob {}", key);
        Ok(())
    }

    /// Download an object as bytes.
    pub async fn download_bytes(&self, key: &str) -> StorageResult<Vec<u8>> {
        let response = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| {
                if e.to_string().contains("NoSuchKey") {
                    StorageError::not_found(key)
                } else {
                    StorageError::upload_failed(e.to_string())
                }
            })?;

        let bytes = response
            .body
            .collect()
            .await
            .map_err(|e| StorageError::upload_failed(e.to_string()))?
            .into_bytes()
            .to_vec();

        Ok(bytes)
    }

    /// Check whether an object exists.
    pub async fn exists(&self, key: &str) -> StorageResult<bool> {
        match self
            .client
            .head_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
        {
            Ok(_) => Ok(true),
            Err(e) if e.to_string().contains("NotFound") => Ok(false),
            Err(e) => Err(StorageError::upload_failed(e.to_string())),
        }
    }

    /// Delete an object. Deleting an absent object is a no-op.
    pub async fn delete_object(&self, key: &str) -> StorageResult<()> {
        debug!("Deleting {}", key);

        self.client
            .delete_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| StorageError::delete_failed(e.to_string()))?;

        Ok(())
    }

    /// Public URL for an uploaded object.
    ///
    /// Uses the configured public base URL when present, otherwise presigns
    /// a GET with the longest allowed lifetime.
    pub async fn public_url(&self, key: &str) -> StorageResult<String> {
        if let Some(base) = &self.public_base_url {
            return Ok(format!("{}/{}", base, key));
        }
        self.presign_get(key, PRESIGN_FALLBACK_TTL).await
    }

    /// Generate a presigned GET URL.
    pub async fn presign_get(&self, key: &str, expires_in: Duration) -> StorageResult<String> {
        let presign_config = PresigningConfig::expires_in(expires_in)
            .map_err(|e| StorageError::PresignFailed(e.to_string()))?;

        let presigned = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .presigned(presign_config)
            .await
            .map_err(|e| StorageError::PresignFailed(e.to_string()))?;

        Ok(presigned.uri().to_string())
    }
}
