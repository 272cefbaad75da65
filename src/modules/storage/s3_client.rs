//! S3-compatible storage backend
//!
//! Works against MinIO or any S3-compatible object store, using path-style
//! URLs. Uses rust-s3 crate for lightweight S3 operations.

use async_trait::async_trait;
use s3::creds::Credentials;
use s3::{Bucket, BucketConfiguration, Region};
use tracing::{debug, info, warn};

use crate::core::config::S3Config;
use crate::core::error::AppError;

use super::BlobStorage;

/// S3-compatible blob store for attachment bytes.
pub struct S3Storage {
    bucket: Box<Bucket>,
    region: Region,
    credentials: Credentials,
}

impl S3Storage {
    /// Create the client and make sure the bucket exists.
    pub async fn new(config: &S3Config) -> Result<Self, AppError> {
        let credentials = Credentials::new(
            Some(&config.access_key),
            Some(&config.secret_key),
            None,
            None,
            None,
        )
        .map_err(|e| AppError::Storage(format!("Failed to create S3 credentials: {}", e)))?;

        let region = Region::Custom {
            region: config.region.clone(),
            endpoint: config.endpoint.clone(),
        };

        let mut bucket = Bucket::new(&config.bucket, region.clone(), credentials.clone())
            .map_err(|e| AppError::Storage(format!("Failed to open S3 bucket: {}", e)))?;

        // Use path-style URLs (http://endpoint/bucket instead of http://bucket.endpoint)
        bucket.set_path_style();

        let client = Self {
            bucket,
            region,
            credentials,
        };

        client.ensure_bucket_exists().await?;

        info!(
            "S3 storage initialized for endpoint: {}, bucket: {}",
            config.endpoint,
            client.bucket.name()
        );

        Ok(client)
    }

    /// Ensure the bucket exists, create if not
    async fn ensure_bucket_exists(&self) -> Result<(), AppError> {
        // Try to create the bucket - an already-existing bucket comes back as
        // an error we can safely ignore
        match self.create_bucket().await {
            Ok(_) => {
                info!("Bucket '{}' created successfully", self.bucket.name());
                Ok(())
            }
            Err(e) => {
                let error_str = e.to_string();
                if error_str.contains("BucketAlreadyOwnedByYou")
                    || error_str.contains("BucketAlreadyExists")
                    || error_str.contains("already own it")
                {
                    debug!("Bucket '{}' already exists", self.bucket.name());
                    Ok(())
                } else {
                    // Log but don't fail startup - the bucket may exist with a
                    // different error shape
                    warn!(
                        "Could not create bucket '{}': {}. Assuming it exists.",
                        self.bucket.name(),
                        e
                    );
                    Ok(())
                }
            }
        }
    }

    async fn create_bucket(&self) -> Result<(), AppError> {
        let bucket_config = BucketConfiguration::default();

        Bucket::create_with_path_style(
            &self.bucket.name(),
            self.region.clone(),
            self.credentials.clone(),
            bucket_config,
        )
        .await
        .map_err(|e| {
            AppError::Storage(format!(
                "Failed to create bucket '{}': {}",
                self.bucket.name(),
                e
            ))
        })?;

        Ok(())
    }

    fn is_missing(error: &str) -> bool {
        error.contains("404") || error.contains("NoSuchKey")
    }
}

#[async_trait]
impl BlobStorage for S3Storage {
    async fn store(
        &self,
        path: &str,
        data: Vec<u8>,
        content_type: &str,
    ) -> Result<String, AppError> {
        self.bucket
            .put_object_with_content_type(path, &data, content_type)
            .await
            .map_err(|e| AppError::Storage(format!("Failed to upload '{}': {}", path, e)))?;

        debug!("Uploaded file '{}' to bucket '{}'", path, self.bucket.name());
        Ok(path.to_string())
    }

    async fn retrieve(&self, path: &str) -> Result<Vec<u8>, AppError> {
        let response = self.bucket.get_object(path).await.map_err(|e| {
            let error_str = e.to_string();
            if Self::is_missing(&error_str) {
                AppError::NotFound(format!("File '{}' not found", path))
            } else {
                AppError::Storage(format!("Failed to download '{}': {}", path, e))
            }
        })?;

        debug!(
            "Downloaded file '{}' from bucket '{}'",
            path,
            self.bucket.name()
        );
        Ok(response.to_vec())
    }

    async fn delete(&self, path: &str) -> Result<bool, AppError> {
        if !self.exists(path).await? {
            return Ok(false);
        }

        self.bucket
            .delete_object(path)
            .await
            .map_err(|e| AppError::Storage(format!("Failed to delete '{}': {}", path, e)))?;

        debug!(
            "Deleted file '{}' from bucket '{}'",
            path,
            self.bucket.name()
        );
        Ok(true)
    }

    async fn exists(&self, path: &str) -> Result<bool, AppError> {
        match self.bucket.head_object(path).await {
            Ok(_) => Ok(true),
            Err(e) => {
                let error_str = e.to_string();
                if Self::is_missing(&error_str) {
                    Ok(false)
                } else {
                    Err(AppError::Storage(format!(
                        "Failed to check if file '{}' exists: {}",
                        path, e
                    )))
                }
            }
        }
    }
}
