//! Storage abstraction trait

use async_trait::async_trait;
use thiserror::Error;
use videoteca_core::AppError;

/// Storage operation errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Upload failed: {0}")]
    UploadFailed(String),

    #[error("Download failed: {0}")]
    DownloadFailed(String),

    #[error("Delete failed: {0}")]
    DeleteFailed(String),

    #[error("File not found: {0}")]
    NotFound(String),

    #[error("Invalid storage key: {0}")]
    InvalidKey(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

impl From<StorageError> for AppError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::NotFound(key) => AppError::NotFound(format!("File not found: {}", key)),
            StorageError::ConfigError(msg) => AppError::Config(msg),
            other => AppError::Storage(other.to_string()),
        }
    }
}

/// File storage collaborator
///
/// Repositories hold an `Arc<dyn Storage>` and never touch the filesystem
/// directly.
#[async_trait]
pub trait Storage: Send + Sync {
    /// Store `data` as `{key_prefix}/{filename}` and return (storage_key, storage_url)
    async fn upload(
        &self,
        key_prefix: &str,
        filename: &str,
        content_type: &str,
        data: Vec<u8>,
    ) -> StorageResult<(String, String)>;

    /// Download a file by its storage key
    async fn download(&self, storage_key: &str) -> StorageResult<Vec<u8>>;

    /// Delete a file by its storage key. Deleting a missing file is not an error.
    async fn delete(&self, storage_key: &str) -> StorageResult<()>;

    /// Check if a file exists
    async fn exists(&self, storage_key: &str) -> StorageResult<bool>;

    /// Public URL under which the file is served
    fn url(&self, storage_key: &str) -> String;
}
