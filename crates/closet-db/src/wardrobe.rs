//! Wardrobe record persistence.

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use closet_core::{AppError, WardrobeItem, WardrobeItemDraft};
use sqlx::PgPool;
use uuid::Uuid;

/// Document-store seam the persistence stage writes through.
///
/// `insert` generates the server-side identifier: callers never supply one,
/// and two inserts of identical drafts yield two records with distinct ids.
#[async_trait]
pub trait WardrobeStore: Send + Sync {
    async fn insert(&self, draft: WardrobeItemDraft) -> Result<WardrobeItem, AppError>;
}

/// Postgres-backed wardrobe store. The full record lives in a JSONB document
/// column; id, owner and creation time are mirrored into columns for lookup.
#[derive(Clone)]
pub struct WardrobeRepository {
    pool: PgPool,
}

impl WardrobeRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl WardrobeStore for WardrobeRepository {
    #[tracing::instrument(
        skip(self, draft),
        fields(db.table = "wardrobe_items", db.operation = "insert", owner_id = %draft.owner_id)
    )]
    async fn insert(&self, draft: WardrobeItemDraft) -> Result<WardrobeItem, AppError> {
        let id = Uuid::new_v4();
        let owner_id = draft.owner_id.clone();
        let created_at = Utc
            .timestamp_millis_opt(draft.created_at)
            .single()
            .unwrap_or_else(Utc::now);

        let item = WardrobeItem::from_draft(id, draft);
        let doc = serde_json::to_value(&item)
            .map_err(|e| AppError::Persistence(format!("Failed to serialize record: {}", e)))?;

        sqlx::query(
            r#"
            INSERT INTO wardrobe_items (id, owner_id, doc, created_at)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(id)
        .bind(&owner_id)
        .bind(&doc)
        .bind(created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, record_id = %id, "Wardrobe insert failed");
            AppError::Persistence(e.to_string())
        })?;

        tracing::info!(record_id = %id, owner_id = %owner_id, "Wardrobe record persisted");

        Ok(item)
    }
}
