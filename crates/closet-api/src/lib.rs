//! Closet API Library
//!
//! This crate provides the HTTP surface of the wardrobe ingestion service:
//! handlers, the ingest pipeline orchestrator, and application setup.

mod handlers;

pub mod error;
pub mod pipeline;
pub mod setup;
pub mod state;
pub mod telemetry;

// Re-exports
pub use error::{ErrorResponse, HttpAppError};
pub use pipeline::{FilePart, IngestPipeline, IngestStage, UploadRequest};
pub use state::AppState;
