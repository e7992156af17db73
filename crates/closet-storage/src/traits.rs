//! Storage abstraction trait
//!
//! This module defines the Storage trait that all storage backends must
//! implement. The ingestion pipeline only needs upload, delete, and an
//! existence check; nothing streams.

use async_trait::async_trait;
use closet_core::StorageBackend;
use thiserror::Error;

/// Storage operation errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Upload failed: {0}")]
    UploadFailed(String),

    #[error("Delete failed: {0}")]
    DeleteFailed(String),

    #[error("File not found: {0}")]
    NotFound(String),

    #[error("Invalid storage key: {0}")]
    InvalidKey(String),

    #[error("Storage backend error: {0}")]
    BackendError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// A durably stored image: internal key plus the stable public URL the
/// downstream analysis stage resolves.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredImage {
    pub key: String,
    pub url: String,
}

/// Storage abstraction trait
///
/// All storage backends (S3, local filesystem) must implement this trait so
/// the pipeline can run against any backend without coupling to
/// implementation details.
///
/// **Key format:** Keys are owner-scoped: `wardrobe/{owner_id}/{uuid}.{ext}`.
/// Key generation is centralized in the `keys` module so all backends stay
/// consistent.
#[async_trait]
pub trait Storage: Send + Sync {
    /// Upload an image and return its storage key and public URL.
    ///
    /// One upload happens per pipeline run; the returned `StoredImage` is
    /// immutable thereafter.
    async fn upload(
        &self,
        owner_id: &str,
        filename: &str,
        content_type: &str,
        data: Vec<u8>,
    ) -> StorageResult<StoredImage>;

    /// Delete a file by its storage key
    async fn delete(&self, storage_key: &str) -> StorageResult<()>;

    /// Check if a file exists
    async fn exists(&self, storage_key: &str) -> StorageResult<bool>;

    /// Get the storage backend type
    fn backend_type(&self) -> StorageBackend;
}
