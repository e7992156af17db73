//! Wardrobe image ingestion handler.
//!
//! Extracts the raw request parts (authorization header, multipart `file`
//! and `ownerId` fields) and hands them to the ingestion pipeline, which
//! owns validation ordering and the stage state machine.

use std::sync::Arc;

use axum::{
    extract::{Multipart, State},
    http::{header, HeaderMap},
    Json,
};
use bytes::Bytes;
use closet_core::{AppError, WardrobeItem};
use serde::Serialize;

use crate::error::HttpAppError;
use crate::pipeline::{FilePart, IngestPipeline, UploadRequest};
use crate::state::AppState;

/// Caller-visible success envelope: `{"success": true, "data": <record>}`.
#[derive(Debug, Serialize)]
pub struct SuccessResponse {
    pub success: bool,
    pub data: WardrobeItem,
}

/// Process an uploaded wardrobe image
///
/// Authenticates the caller, stores the image, runs vision analysis and
/// embedding, and persists the assembled record. Returns the persisted
/// record on success.
///
/// # Errors
/// - `AppError::Unauthorized` - missing/invalid credential or owner mismatch (401)
/// - `AppError::BadRequest` - missing file or ownerId field (400)
/// - `AppError::Storage` / `Analysis` / `Persistence` - failed stage (500)
#[tracing::instrument(skip(state, headers, multipart), fields(operation = "process_image"))]
pub async fn process_image(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    multipart: Multipart,
) -> Result<Json<SuccessResponse>, HttpAppError> {
    let authorization = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .map(String::from);

    let (file, owner_id) = read_multipart(multipart).await?;

    let pipeline = IngestPipeline::from_state(&state);
    let item = pipeline
        .run(UploadRequest {
            authorization,
            owner_id,
            file,
        })
        .await?;

    Ok(Json(SuccessResponse {
        success: true,
        data: item,
    }))
}

/// Pull the `file` and `ownerId` fields out of the multipart form. Absent
/// fields are reported as `None`; the pipeline decides how to fault them so
/// the 401-before-400 ordering stays in one place.
async fn read_multipart(
    mut multipart: Multipart,
) -> Result<(Option<FilePart>, Option<String>), AppError> {
    let mut file: Option<FilePart> = None;
    let mut owner_id: Option<String> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(format!("Invalid multipart body: {}", e)))?
    {
        match field.name() {
            Some("file") => {
                let filename = field.file_name().unwrap_or("upload").to_string();
                let content_type = field
                    .content_type()
                    .unwrap_or("application/octet-stream")
                    .to_string();
                let data: Bytes = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::BadRequest(format!("Failed to read file: {}", e)))?;
                file = Some(FilePart {
                    filename,
                    content_type,
                    data,
                });
            }
            Some("ownerId") => {
                let value = field
                    .text()
                    .await
                    .map_err(|e| AppError::BadRequest(format!("Failed to read ownerId: {}", e)))?;
                owner_id = Some(value);
            }
            // Unknown fields are ignored
            _ => {}
        }
    }

    Ok((file, owner_id))
}
