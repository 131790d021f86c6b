//! Remote asset backend
//!
//! Stores and deletes binary images in S3. Uploads return a durable
//! reference id and a public URL; the reference id is what deletion uses
//! later. The crop/resize transform is a policy value handed to the backend,
//! not a hardcoded behavior: the S3 implementation forwards it as object
//! metadata for the downstream image pipeline.

use anyhow::{Context, Result};
use async_trait::async_trait;
use aws_sdk_s3::Client;
use aws_sdk_s3::primitives::ByteStream;
use std::env;
use tracing::info;
use uuid::Uuid;

/// Transform applied to uploaded images
#[derive(Debug, Clone)]
pub struct TransformPolicy {
    pub width: u32,
    pub height: u32,
    /// Crop mode, e.g. "fill"
    pub crop: String,
    /// Crop anchor, e.g. "face"
    pub gravity: String,
}

impl Default for TransformPolicy {
    fn default() -> Self {
        Self {
            width: 500,
            height: 500,
            crop: "fill".to_string(),
            gravity: "face".to_string(),
        }
    }
}

impl TransformPolicy {
    /// Create a TransformPolicy from environment variables, falling back to
    /// the default square face crop
    ///
    /// # Environment Variables
    /// - `PHOTO_TRANSFORM_WIDTH` / `PHOTO_TRANSFORM_HEIGHT` (default: 500)
    /// - `PHOTO_TRANSFORM_CROP` (default: "fill")
    /// - `PHOTO_TRANSFORM_GRAVITY` (default: "face")
    pub fn from_env() -> Self {
        let default = Self::default();

        Self {
            width: env::var("PHOTO_TRANSFORM_WIDTH")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(default.width),
            height: env::var("PHOTO_TRANSFORM_HEIGHT")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(default.height),
            crop: env::var("PHOTO_TRANSFORM_CROP").unwrap_or(default.crop),
            gravity: env::var("PHOTO_TRANSFORM_GRAVITY").unwrap_or(default.gravity),
        }
    }
}

/// Result of a successful upload
#[derive(Debug, Clone)]
pub struct StoredAsset {
    /// Opaque reference id used for later deletion
    pub asset_id: String,
    /// Public URL of the stored image
    pub url: String,
}

/// Remote storage for image blobs
#[async_trait]
pub trait AssetBackend: Send + Sync {
    /// Store an image and return its reference id and URL
    async fn upload(&self, bytes: Vec<u8>, transform: &TransformPolicy) -> Result<StoredAsset>;

    /// Delete a previously stored image by reference id
    async fn delete(&self, asset_id: &str) -> Result<()>;
}

/// S3 asset backend configuration
#[derive(Debug, Clone)]
pub struct S3Config {
    /// Bucket that holds the uploaded photos
    pub bucket: String,
    /// Base URL that serves objects from the bucket
    pub public_base_url: String,
}

impl S3Config {
    /// Create an S3Config from environment variables
    ///
    /// # Environment Variables
    /// - `PHOTO_BUCKET_NAME`: bucket for uploads (default: "kindred-photos")
    /// - `PHOTO_PUBLIC_BASE_URL`: URL prefix for stored objects
    pub fn from_env() -> Self {
        let bucket =
            env::var("PHOTO_BUCKET_NAME").unwrap_or_else(|_| "kindred-photos".to_string());
        let public_base_url = env::var("PHOTO_PUBLIC_BASE_URL")
            .unwrap_or_else(|_| format!("https://{}.s3.amazonaws.com", bucket));

        Self {
            bucket,
            public_base_url,
        }
    }
}

/// S3-backed asset storage
#[derive(Clone)]
pub struct S3AssetBackend {
    client: Client,
    config: S3Config,
}

impl S3AssetBackend {
    /// Create a new S3 asset backend
    pub fn new(client: Client, config: S3Config) -> Self {
        Self { client, config }
    }
}

#[async_trait]
impl AssetBackend for S3AssetBackend {
    async fn upload(&self, bytes: Vec<u8>, transform: &TransformPolicy) -> Result<StoredAsset> {
        let key = Uuid::new_v4().to_string();

        self.client
            .put_object()
            .bucket(&self.config.bucket)
            .key(&key)
            .body(ByteStream::from(bytes))
            .metadata(
                "transform",
                format!(
                    "{}x{},crop={},gravity={}",
                    transform.width, transform.height, transform.crop, transform.gravity
                ),
            )
            .send()
            .await
            .with_context(|| format!("failed to upload object {} to S3", key))?;

        info!("Uploaded photo asset {}", key);

        let url = format!(
            "{}/{}",
            self.config.public_base_url.trim_end_matches('/'),
            key
        );

        Ok(StoredAsset { asset_id: key, url })
    }

    async fn delete(&self, asset_id: &str) -> Result<()> {
        self.client
            .delete_object()
            .bucket(&self.config.bucket)
            .key(asset_id)
            .send()
            .await
            .with_context(|| format!("failed to delete object {} from S3", asset_id))?;

        info!("Deleted photo asset {}", asset_id);
        Ok(())
    }
}
