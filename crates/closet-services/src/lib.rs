//! Closet Services Library
//!
//! External collaborator clients for the ingestion pipeline: the identity
//! verifier, the vision analyzer, and the embedding service. Each collaborator
//! sits behind a trait so the pipeline can be tested against stubs.

pub mod auth;
pub mod embedding;
pub mod vision;

pub use auth::{ensure_initialized, extract_bearer, global_verifier, IdentityVerifier, JwtVerifier};
pub use embedding::{ClipEmbedder, Embedder, EmbeddingError};
pub use vision::{decode_analysis_body, AnalysisOutcome, ClothingAnalyzer, OpenAiVisionAnalyzer};
