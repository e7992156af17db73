//! Closet Storage Library
//!
//! This crate provides the storage abstraction behind the ingestion
//! pipeline's upload stage, plus S3 and local filesystem implementations.
//!
//! # Storage key format
//!
//! Keys are owner-scoped: `wardrobe/{owner_id}/{uuid}.{ext}`. Keys must not
//! contain `..` or a leading `/`. Key generation is centralized in the
//! `keys` module so all backends stay consistent.

pub mod factory;
pub(crate) mod keys;
#[cfg(feature = "storage-local")]
pub mod local;
#[cfg(feature = "storage-s3")]
pub mod s3;
pub mod traits;

// Re-export commonly used types
pub use closet_core::StorageBackend;
pub use factory::create_storage;
#[cfg(feature = "storage-local")]
pub use local::LocalStorage;
#[cfg(feature = "storage-s3")]
pub use s3::S3Storage;
pub use traits::{Storage, StorageError, StorageResult, StoredImage};
