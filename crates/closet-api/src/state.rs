//! Application state.
//!
//! All collaborators sit behind their trait objects so the ingestion pipeline
//! can run against real services in production and stubs in tests.

use closet_core::Config;
use closet_db::WardrobeStore;
use closet_services::{ClothingAnalyzer, Embedder, IdentityVerifier};
use closet_storage::Storage;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub verifier: Arc<dyn IdentityVerifier>,
    pub storage: Arc<dyn Storage>,
    pub analyzer: Arc<dyn ClothingAnalyzer>,
    pub embedder: Arc<dyn Embedder>,
    pub wardrobe: Arc<dyn WardrobeStore>,
}
