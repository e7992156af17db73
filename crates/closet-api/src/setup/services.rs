//! Collaborator and state initialization.

use crate::state::AppState;
use anyhow::{Context, Result};
use closet_core::Config;
use closet_db::{setup_database, WardrobeRepository};
use closet_services::{global_verifier, ClipEmbedder, OpenAiVisionAnalyzer};
use closet_storage::create_storage;
use std::sync::Arc;

/// Build the production AppState: Postgres-backed wardrobe store, configured
/// storage backend, and the real analyzer/embedder/verifier clients.
pub async fn initialize_services(config: &Config) -> Result<Arc<AppState>> {
    let pool = setup_database(config).await?;
    let wardrobe = Arc::new(WardrobeRepository::new(pool));

    let storage = create_storage(config)
        .await
        .context("Failed to initialize storage backend")?;

    let verifier = global_verifier()
        .map_err(|e| anyhow::anyhow!("Identity verifier unavailable: {}", e))?;

    let analyzer = Arc::new(
        OpenAiVisionAnalyzer::from_config(config)
            .context("Failed to initialize vision analyzer")?,
    );
    let embedder = Arc::new(
        ClipEmbedder::from_config(config).context("Failed to initialize embedding client")?,
    );

    tracing::info!(
        storage_backend = ?config.storage_backend,
        vision_model = %config.vision_model,
        embedding_dimension = config.embedding_dimension,
        "Services initialized"
    );

    Ok(Arc::new(AppState {
        config: config.clone(),
        verifier,
        storage,
        analyzer,
        embedder,
        wardrobe,
    }))
}
