//! Storage backends for submitted attachments
//!
//! One blob contract, two interchangeable backends: the local filesystem and
//! an S3-compatible object store. Both accept the paths produced by
//! [`derive_path`] verbatim, so the physical backend never leaks into the
//! layout.

mod local_storage;
mod paths;
mod s3_client;

pub use local_storage::LocalStorage;
pub use paths::derive_path;
pub use s3_client::S3Storage;

use std::sync::Arc;

use async_trait::async_trait;
use tracing::info;

use crate::core::config::{StorageBackend, StorageConfig};
use crate::core::error::AppError;

/// Contract both storage backends satisfy.
#[async_trait]
pub trait BlobStorage: Send + Sync {
    /// Store bytes at `path`, returning the stored path.
    async fn store(&self, path: &str, data: Vec<u8>, content_type: &str)
        -> Result<String, AppError>;

    async fn retrieve(&self, path: &str) -> Result<Vec<u8>, AppError>;

    /// Remove the object; `false` when there was nothing to remove.
    async fn delete(&self, path: &str) -> Result<bool, AppError>;

    async fn exists(&self, path: &str) -> Result<bool, AppError>;
}

/// Build the backend selected by configuration.
pub async fn connect(config: &StorageConfig) -> Result<Arc<dyn BlobStorage>, AppError> {
    match config.backend {
        StorageBackend::Local => {
            tokio::fs::create_dir_all(&config.local_root)
                .await
                .map_err(|e| {
                    AppError::Storage(format!(
                        "failed to create storage root '{}': {}",
                        config.local_root, e
                    ))
                })?;
            info!("Local blob storage initialized at: {}", config.local_root);
            Ok(Arc::new(LocalStorage::new(config.local_root.clone())))
        }
        StorageBackend::S3 => Ok(Arc::new(S3Storage::new(&config.s3).await?)),
    }
}
