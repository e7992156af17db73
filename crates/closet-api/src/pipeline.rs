//! Wardrobe ingestion pipeline.
//!
//! One run is a strictly linear state machine:
//!
//! `AwaitingAuth → Uploading → Analyzing → Embedding → Assembling →
//! Persisting → Done`
//!
//! Every transition is one-way and no stage is re-entered within a request.
//! `Aborted` is reachable from every non-terminal state except `Embedding`:
//! an embedding failure degrades the record and transitions forward. The
//! identity gate runs strictly before any side-effecting stage, so an
//! unauthenticated or malformed request causes zero external calls beyond
//! credential verification itself.

use bytes::Bytes;
use chrono::Utc;
use closet_core::{assemble_draft, AppError, WardrobeItem};
use closet_db::WardrobeStore;
use closet_services::{extract_bearer, ClothingAnalyzer, Embedder, IdentityVerifier};
use closet_storage::Storage;
use std::sync::Arc;
use uuid::Uuid;

use crate::state::AppState;

/// Pipeline stages, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IngestStage {
    AwaitingAuth,
    Uploading,
    Analyzing,
    Embedding,
    Assembling,
    Persisting,
    Done,
    Aborted,
}

impl IngestStage {
    /// One-way transition to the next stage. `Done` and `Aborted` are
    /// terminal.
    pub fn advance(self) -> IngestStage {
        match self {
            IngestStage::AwaitingAuth => IngestStage::Uploading,
            IngestStage::Uploading => IngestStage::Analyzing,
            IngestStage::Analyzing => IngestStage::Embedding,
            IngestStage::Embedding => IngestStage::Assembling,
            IngestStage::Assembling => IngestStage::Persisting,
            IngestStage::Persisting => IngestStage::Done,
            IngestStage::Done => IngestStage::Done,
            IngestStage::Aborted => IngestStage::Aborted,
        }
    }

    /// Whether a failure in this stage transitions to `Aborted`. An
    /// embedding failure degrades the record and transitions forward
    /// instead; terminal stages have no failures left to take.
    pub fn can_abort(self) -> bool {
        !matches!(
            self,
            IngestStage::Embedding | IngestStage::Done | IngestStage::Aborted
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            IngestStage::AwaitingAuth => "awaiting_auth",
            IngestStage::Uploading => "uploading",
            IngestStage::Analyzing => "analyzing",
            IngestStage::Embedding => "embedding",
            IngestStage::Assembling => "assembling",
            IngestStage::Persisting => "persisting",
            IngestStage::Done => "done",
            IngestStage::Aborted => "aborted",
        }
    }
}

/// One uploaded file as extracted from the multipart form.
#[derive(Debug, Clone)]
pub struct FilePart {
    pub filename: String,
    pub content_type: String,
    pub data: Bytes,
}

/// Raw, unvalidated inputs for one pipeline run. Validation belongs to the
/// pipeline so the 401/400 ordering is in one place.
#[derive(Debug, Clone, Default)]
pub struct UploadRequest {
    /// Raw `Authorization` header value, if any.
    pub authorization: Option<String>,
    pub owner_id: Option<String>,
    pub file: Option<FilePart>,
}

/// The orchestrator. Holds every collaborator behind its trait seam.
#[derive(Clone)]
pub struct IngestPipeline {
    verifier: Arc<dyn IdentityVerifier>,
    storage: Arc<dyn Storage>,
    analyzer: Arc<dyn ClothingAnalyzer>,
    embedder: Arc<dyn Embedder>,
    wardrobe: Arc<dyn WardrobeStore>,
}

impl IngestPipeline {
    pub fn new(
        verifier: Arc<dyn IdentityVerifier>,
        storage: Arc<dyn Storage>,
        analyzer: Arc<dyn ClothingAnalyzer>,
        embedder: Arc<dyn Embedder>,
        wardrobe: Arc<dyn WardrobeStore>,
    ) -> Self {
        Self {
            verifier,
            storage,
            analyzer,
            embedder,
            wardrobe,
        }
    }

    pub fn from_state(state: &AppState) -> Self {
        Self::new(
            state.verifier.clone(),
            state.storage.clone(),
            state.analyzer.clone(),
            state.embedder.clone(),
            state.wardrobe.clone(),
        )
    }

    /// Run the full ingestion pipeline for one request.
    #[tracing::instrument(skip(self, request), fields(owner_id = tracing::field::Empty))]
    pub async fn run(&self, request: UploadRequest) -> Result<WardrobeItem, AppError> {
        let mut stage = IngestStage::AwaitingAuth;

        // Identity gate: header form, credential verification, then the
        // subject/ownerId match. Nothing side-effecting has happened yet.
        let token = extract_bearer(request.authorization.as_deref())?;
        let subject = self.verifier.verify(token).await.map_err(|e| {
            tracing::debug!(stage = stage.as_str(), "Pipeline aborted");
            e
        })?;

        let file = request
            .file
            .ok_or_else(|| AppError::BadRequest("No file provided".to_string()))?;
        let owner_id = request
            .owner_id
            .filter(|id| !id.is_empty())
            .ok_or_else(|| AppError::BadRequest("No owner ID provided".to_string()))?;

        if subject != owner_id {
            return Err(AppError::Unauthorized("Owner ID mismatch".to_string()));
        }
        tracing::Span::current().record("owner_id", owner_id.as_str());

        stage = stage.advance();
        tracing::debug!(stage = stage.as_str(), "Uploading image");
        let stored = self
            .storage
            .upload(
                &owner_id,
                &file.filename,
                &file.content_type,
                file.data.to_vec(),
            )
            .await
            .map_err(|e| self.abort(stage, AppError::Storage(e.to_string())))?;

        stage = stage.advance();
        tracing::debug!(stage = stage.as_str(), url = %stored.url, "Analyzing image");
        let analysis = self
            .analyzer
            .analyze(&stored.url)
            .await
            .map_err(|e| self.abort(stage, e))?;

        // Request-scoped temporary identifier for the embedding call only;
        // deliberately distinct from the persisted record id.
        stage = stage.advance();
        let temp_id = Uuid::new_v4();
        tracing::debug!(stage = stage.as_str(), temp_id = %temp_id, "Computing embedding");
        let embedding = match self.embedder.embed(file.data.clone(), temp_id).await {
            Ok(vector) => Some(vector),
            Err(e) => {
                // The one degraded failure: record proceeds without a vector.
                tracing::warn!(stage = stage.as_str(), error = %e, "Embedding unavailable, continuing");
                None
            }
        };

        stage = stage.advance();
        tracing::debug!(stage = stage.as_str(), "Assembling record");
        let draft = assemble_draft(analysis, &owner_id, &stored.url, embedding, Utc::now());

        stage = stage.advance();
        tracing::debug!(stage = stage.as_str(), "Persisting record");
        let item = self
            .wardrobe
            .insert(draft)
            .await
            .map_err(|e| self.abort(stage, e))?;

        stage = stage.advance();
        debug_assert_eq!(stage, IngestStage::Done);
        tracing::info!(record_id = %item.id, "Ingestion pipeline completed");

        Ok(item)
    }

    /// Transition to the terminal `Aborted` state. No cleanup of earlier
    /// side effects is attempted: an uploaded-but-unanalyzed image staying
    /// in storage is an accepted inconsistency window.
    fn abort(&self, stage: IngestStage, error: AppError) -> AppError {
        debug_assert!(stage.can_abort());
        tracing::warn!(
            from = stage.as_str(),
            stage = IngestStage::Aborted.as_str(),
            error_type = error.error_type(),
            "Pipeline aborted"
        );
        error
    }
}
