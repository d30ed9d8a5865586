//! Storage abstraction trait
//!
//! This module defines the Storage trait that persistence backends implement.

use async_trait::async_trait;
use bytes::Bytes;
use outreach_core::{AppError, CandidateFile, MediaCategory, StoredFileReference};
use thiserror::Error;

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

impl From<StorageError> for AppError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::NotFound(_) => AppError::NotFound("File not found".to_string()),
            StorageError::InvalidKey(msg) => AppError::InvalidInput(msg),
            other => AppError::Storage(other.to_string()),
        }
    }
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Persistence collaborator for accepted uploads.
///
/// Keys are owner-scoped: `{category}/{owner_id}/{uuid}-{filename}`.
#[async_trait]
pub trait Storage: Send + Sync {
    /// Persist one accepted file and return its reference
    async fn store(
        &self,
        owner_id: &str,
        category: MediaCategory,
        file: &CandidateFile,
    ) -> StorageResult<StoredFileReference>;

    /// Read a file by its storage key
    async fn download(&self, storage_key: &str) -> StorageResult<Bytes>;

    /// Delete a file by its storage key. Missing files are `NotFound`.
    async fn delete(&self, storage_key: &str) -> StorageResult<()>;

    /// Check if a file exists
    async fn exists(&self, storage_key: &str) -> StorageResult<bool>;

    /// Verify the backend is reachable and writable
    async fn health_check(&self) -> StorageResult<()>;
}
