use std::path::PathBuf;

use async_trait::async_trait;
use tokio::fs;
use tracing::debug;

use crate::core::error::AppError;

use super::BlobStorage;

/// Filesystem-backed blob store, the default for development.
///
/// Objects live under a root directory with the same `forms/...` layout the
/// S3 backend uses, so the two are interchangeable behind [`BlobStorage`].
pub struct LocalStorage {
    root: PathBuf,
}

impl LocalStorage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Derived paths are already sanitized; this guards direct callers.
    fn resolve(&self, path: &str) -> Result<PathBuf, AppError> {
        if path.starts_with('/') || path.split('/').any(|segment| segment == "..") {
            return Err(AppError::Storage(format!("refusing unsafe path '{}'", path)));
        }
        Ok(self.root.join(path))
    }
}

#[async_trait]
impl BlobStorage for LocalStorage {
    async fn store(
        &self,
        path: &str,
        data: Vec<u8>,
        _content_type: &str,
    ) -> Result<String, AppError> {
        let target = self.resolve(path)?;
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent).await.map_err(|e| {
                AppError::Storage(format!("failed to create directory for '{}': {}", path, e))
            })?;
        }
        fs::write(&target, data)
            .await
            .map_err(|e| AppError::Storage(format!("failed to write '{}': {}", path, e)))?;

        debug!("Stored file at '{}'", target.display());
        Ok(path.to_string())
    }

    async fn retrieve(&self, path: &str) -> Result<Vec<u8>, AppError> {
        let target = self.resolve(path)?;
        fs::read(&target).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                AppError::NotFound(format!("File '{}' not found", path))
            } else {
                AppError::Storage(format!("failed to read '{}': {}", path, e))
            }
        })
    }

    async fn delete(&self, path: &str) -> Result<bool, AppError> {
        let target = self.resolve(path)?;
        match fs::remove_file(&target).await {
            Ok(()) => {
                debug!("Deleted file '{}'", target.display());
                Ok(true)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(AppError::Storage(format!(
                "failed to delete '{}': {}",
                path, e
            ))),
        }
    }

    async fn exists(&self, path: &str) -> Result<bool, AppError> {
        let target = self.resolve(path)?;
        fs::try_exists(&target)
            .await
            .map_err(|e| AppError::Storage(format!("failed to stat '{}': {}", path, e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn store_retrieve_delete_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let storage = LocalStorage::new(dir.path());
        let path = "forms/survey/2025/08/sub1/doc_12345678_a.txt";

        storage
            .store(path, b"hello".to_vec(), "text/plain")
            .await
            .unwrap();
        assert!(storage.exists(path).await.unwrap());
        assert_eq!(storage.retrieve(path).await.unwrap(), b"hello");

        assert!(storage.delete(path).await.unwrap());
        assert!(!storage.exists(path).await.unwrap());
        // Deleting again reports that nothing was there.
        assert!(!storage.delete(path).await.unwrap());
    }

    #[tokio::test]
    async fn retrieving_a_missing_file_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let storage = LocalStorage::new(dir.path());

        let err = storage.retrieve("forms/none/missing.txt").await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn unsafe_paths_are_refused() {
        let dir = tempfile::tempdir().unwrap();
        let storage = LocalStorage::new(dir.path());

        for path in ["../escape.txt", "/etc/passwd", "forms/../../escape"] {
            let err = storage
                .store(path, b"x".to_vec(), "text/plain")
                .await
                .unwrap_err();
            assert!(matches!(err, AppError::Storage(_)), "accepted {path}");
        }
    }
}
