//! Vision analysis client.
//!
//! Sends the stored image URL to an OpenAI-compatible chat-completions
//! endpoint and decodes the reply into a tagged outcome. The analyzer's
//! response is ad hoc JSON and is never trusted as the success shape by
//! default: a body carrying an `error` discriminator is a failure even when
//! the HTTP status is 200.

use anyhow::{Context, Result};
use async_trait::async_trait;
use closet_core::{AppError, ClothingAnalysis, Config};
use serde::Deserialize;
use serde_json::json;
use std::fmt::{Debug, Formatter, Result as FmtResult};
use std::time::Duration;

/// Invokes the external analyzer on a stored image reference.
#[async_trait]
pub trait ClothingAnalyzer: Send + Sync {
    async fn analyze(&self, image_url: &str) -> Result<ClothingAnalysis, AppError>;
}

/// Boundary decoding result for an analyzer response body.
#[derive(Debug)]
pub enum AnalysisOutcome {
    Success(ClothingAnalysis),
    Failure { reason: String },
}

const ANALYSIS_PROMPT: &str = "\
Analyze the clothing item in this image and respond with a single JSON object \
with these fields: type (e.g. shirt, pants, dress), subType, name, color, \
season (array of: spring, summer, fall, winter), style (array of style tags), \
occasion (array), material, pattern, fit, brand if visible, colorAnalysis \
{dominant, matching}, and metadata for anything else notable. \
Respond with valid JSON only.";

/// OpenAI-compatible vision analyzer
pub struct OpenAiVisionAnalyzer {
    http_client: reqwest::Client,
    api_base: String,
    api_key: String,
    model: String,
}

impl Debug for OpenAiVisionAnalyzer {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("OpenAiVisionAnalyzer")
            .field("api_base", &self.api_base)
            .field("model", &self.model)
            .finish()
    }
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    content: Option<String>,
}

impl OpenAiVisionAnalyzer {
    pub fn from_config(config: &Config) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.vision_timeout_seconds))
            .build()
            .context("Failed to create HTTP client for vision analysis")?;

        Ok(Self {
            http_client,
            api_base: config.vision_api_base.clone(),
            api_key: config.vision_api_key.clone(),
            model: config.vision_model.clone(),
        })
    }

    #[cfg(test)]
    fn with_base(api_base: String) -> Self {
        Self {
            http_client: reqwest::Client::new(),
            api_base,
            api_key: "test-key".to_string(),
            model: "gpt-4o".to_string(),
        }
    }

    /// Call the chat-completions API with the image URL and return the raw
    /// assistant text.
    async fn request_analysis(&self, image_url: &str) -> Result<String, AppError> {
        let body = json!({
            "model": self.model,
            "max_tokens": 1024,
            "messages": [{
                "role": "user",
                "content": [
                    {"type": "text", "text": ANALYSIS_PROMPT},
                    {"type": "image_url", "image_url": {"url": image_url}}
                ]
            }]
        });

        let response = self
            .http_client
            .post(format!("{}/chat/completions", self.api_base))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| AppError::Analysis(format!("Vision API request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(AppError::Analysis(format!(
                "Vision API returned {}: {}",
                status, error_text
            )));
        }

        let parsed: ChatCompletionResponse = response
            .json()
            .await
            .map_err(|e| AppError::Analysis(format!("Malformed vision API response: {}", e)))?;

        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| AppError::Analysis("Vision API returned no content".to_string()))
    }
}

/// Strip markdown code fences the analyzer sometimes wraps around its JSON.
fn strip_code_fences(text: &str) -> &str {
    if text.contains("```json") {
        text.split("```json")
            .nth(1)
            .and_then(|s| s.split("```").next())
            .unwrap_or(text)
            .trim()
    } else if text.contains("```") {
        text.split("```")
            .nth(1)
            .and_then(|s| s.split("```").next())
            .unwrap_or(text)
            .trim()
    } else {
        text.trim()
    }
}

/// Decode an analyzer response body into a tagged outcome.
pub fn decode_analysis_body(text: &str) -> AnalysisOutcome {
    let json_text = strip_code_fences(text);

    let value: serde_json::Value = match serde_json::from_str(json_text) {
        Ok(v) => v,
        Err(e) => {
            return AnalysisOutcome::Failure {
                reason: format!("Analyzer returned non-JSON body: {}", e),
            }
        }
    };

    // An error discriminator marks the whole analysis as failed no matter
    // what else the body carries.
    if let Some(err) = value.get("error") {
        let reason = err
            .as_str()
            .map(String::from)
            .unwrap_or_else(|| err.to_string());
        return AnalysisOutcome::Failure { reason };
    }

    match serde_json::from_value::<ClothingAnalysis>(value) {
        Ok(analysis) => AnalysisOutcome::Success(analysis),
        Err(e) => AnalysisOutcome::Failure {
            reason: format!("Analyzer response missing required fields: {}", e),
        },
    }
}

#[async_trait]
impl ClothingAnalyzer for OpenAiVisionAnalyzer {
    #[tracing::instrument(skip(self), fields(image_url = %image_url))]
    async fn analyze(&self, image_url: &str) -> Result<ClothingAnalysis, AppError> {
        let text = self.request_analysis(image_url).await?;

        match decode_analysis_body(&text) {
            AnalysisOutcome::Success(analysis) => {
                tracing::debug!(item_type = %analysis.item_type, "Image analysis succeeded");
                Ok(analysis)
            }
            AnalysisOutcome::Failure { reason } => {
                tracing::warn!(reason = %reason, "Image analysis failed");
                Err(AppError::Analysis(reason))
            }
        }
    }
}
