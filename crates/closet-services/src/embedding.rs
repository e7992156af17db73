//! Embedding service client.
//!
//! Posts the original image bytes (plus a request-scoped temporary id) to a
//! CLIP sidecar and returns the vector descriptor. Every failure mode —
//! connection error, non-success status, malformed body, wrong dimension —
//! surfaces as [`EmbeddingError`]; the pipeline treats all of them as
//! "unavailable" and continues without an embedding.

use anyhow::{Context, Result};
use async_trait::async_trait;
use bytes::Bytes;
use closet_core::Config;
use serde::Deserialize;
use std::time::Duration;
use uuid::Uuid;

/// Embedding failure. Non-fatal by contract: callers degrade, never abort.
#[derive(Debug, thiserror::Error)]
#[error("Embedding unavailable: {0}")]
pub struct EmbeddingError(pub String);

/// Computes a vector descriptor for an image.
#[async_trait]
pub trait Embedder: Send + Sync {
    /// `item_id` is the request-scoped temporary identifier, never the
    /// persisted record id.
    async fn embed(&self, image: Bytes, item_id: Uuid) -> Result<Vec<f32>, EmbeddingError>;
}

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    embedding: Vec<f32>,
}

/// HTTP client for the CLIP embedding sidecar
pub struct ClipEmbedder {
    http_client: reqwest::Client,
    service_url: String,
    expected_dimension: usize,
}

impl ClipEmbedder {
    pub fn from_config(config: &Config) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.embedding_timeout_seconds))
            .build()
            .context("Failed to create HTTP client for embedding service")?;

        Ok(Self {
            http_client,
            service_url: config.embedding_service_url.clone(),
            expected_dimension: config.embedding_dimension,
        })
    }

    #[cfg(test)]
    fn new_for_test(service_url: String, expected_dimension: usize) -> Self {
        Self {
            http_client: reqwest::Client::new(),
            service_url,
            expected_dimension,
        }
    }
}

#[async_trait]
impl Embedder for ClipEmbedder {
    #[tracing::instrument(skip(self, image), fields(item_id = %item_id, size_bytes = image.len()))]
    async fn embed(&self, image: Bytes, item_id: Uuid) -> Result<Vec<f32>, EmbeddingError> {
        let part = reqwest::multipart::Part::bytes(image.to_vec())
            .file_name("image")
            .mime_str("application/octet-stream")
            .map_err(|e| EmbeddingError(format!("Invalid multipart payload: {}", e)))?;
        let form = reqwest::multipart::Form::new()
            .part("image", part)
            .text("item_id", item_id.to_string());

        let response = self
            .http_client
            .post(&self.service_url)
            .multipart(form)
            .send()
            .await
            .map_err(|e| EmbeddingError(format!("Request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(EmbeddingError(format!(
                "Embedding service returned {}",
                status
            )));
        }

        let parsed: EmbeddingResponse = response
            .json()
            .await
            .map_err(|e| EmbeddingError(format!("Malformed embedding response: {}", e)))?;

        if parsed.embedding.len() != self.expected_dimension {
            return Err(EmbeddingError(format!(
                "Expected {}-dimensional embedding, got {}",
                self.expected_dimension,
                parsed.embedding.len()
            )));
        }

        Ok(parsed.embedding)
    }
}
