//! Blob storage abstraction for image attachments.
//!
//! The content engine only needs the narrow contract: store a blob under a
//! unique key, resolve it to a URL, check existence, delete it.

use std::path::PathBuf;

use crate::{AppError, AppResult};

/// Stored blob metadata.
#[derive(Debug, Clone)]
pub struct StoredBlob {
    /// Storage key (path or object key).
    pub key: String,
    /// Public URL to access the blob.
    pub url: String,
    /// Size in bytes.
    pub size: u64,
    /// MIME content type.
    pub content_type: String,
    /// MD5 hash of the content.
    pub md5: String,
}

/// Storage backend trait.
#[async_trait::async_trait]
pub trait StorageBackend: Send + Sync {
    /// Store a blob under the given key.
    async fn upload(&self, key: &str, data: &[u8], content_type: &str) -> AppResult<StoredBlob>;

    /// Delete a blob.
    async fn delete(&self, key: &str) -> AppResult<()>;

    /// Get the public URL for a key.
    fn public_url(&self, key: &str) -> String;

    /// Check if a blob exists.
    async fn exists(&self, key: &str) -> AppResult<bool>;
}

/// Local filesystem storage backend.
pub struct LocalStorage {
    base_path: PathBuf,
    base_url: String,
}

impl LocalStorage {
    /// Create a new local storage backend.
    #[must_use]
    pub const fn new(base_path: PathBuf, base_url: String) -> Self {
        Self { base_path, base_url }
    }
}

#[async_trait::async_trait]
impl StorageBackend for LocalStorage {
    async fn upload(&self, key: &str, data: &[u8], content_type: &str) -> AppResult<StoredBlob> {
        let path = self.base_path.join(key);

        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| AppError::Storage(format!("Failed to create directory: {e}")))?;
        }

        tokio::fs::write(&path, data)
            .await
            .map_err(|e| AppError::Storage(format!("Failed to write file: {e}")))?;

        let md5 = format!("{:x}", md5::compute(data));

        Ok(StoredBlob {
            key: key.to_string(),
            url: self.public_url(key),
            size: data.len() as u64,
            content_type: content_type.to_string(),
            md5,
        })
    }

    async fn delete(&self, key: &str) -> AppResult<()> {
        let path = self.base_path.join(key);
        if path.exists() {
            tokio::fs::remove_file(&path)
                .await
                .map_err(|e| AppError::Storage(format!("Failed to delete file: {e}")))?;
        }
        Ok(())
    }

    fn public_url(&self, key: &str) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), key)
    }

    async fn exists(&self, key: &str) -> AppResult<bool> {
        let path = self.base_path.join(key);
        Ok(path.exists())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_public_url_joins_cleanly() {
        let storage = LocalStorage::new(PathBuf::from("/tmp/blobs"), "/files/".to_string());
        assert_eq!(storage.public_url("posts/a/b.png"), "/files/posts/a/b.png");
    }

    #[tokio::test]
    async fn test_upload_and_delete_roundtrip() {
        let dir = std::env::temp_dir().join(format!("hearth-storage-{}", uuid::Uuid::new_v4()));
        let storage = LocalStorage::new(dir.clone(), "/files".to_string());

        let blob = storage
            .upload("posts/x/test.png", b"not-really-a-png", "image/png")
            .await
            .unwrap();
        assert_eq!(blob.size, 16);
        assert!(storage.exists("posts/x/test.png").await.unwrap());

        storage.delete("posts/x/test.png").await.unwrap();
        assert!(!storage.exists("posts/x/test.png").await.unwrap());

        tokio::fs::remove_dir_all(dir).await.ok();
    }
}
