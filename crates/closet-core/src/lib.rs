//! Closet Core Library
//!
//! This crate provides the domain models, error types, configuration, and the
//! pure record assembler shared across all Closet components.

pub mod config;
pub mod error;
pub mod models;

// Re-export commonly used types
pub use config::{Config, StorageBackend};
pub use error::{AppError, ErrorMetadata, LogLevel};
pub use models::{
    assemble_draft, normalize_item_metadata, ClothingAnalysis, ColorAnalysis, Season,
    WardrobeItem, WardrobeItemDraft,
};
