//! Application setup and initialization
//!
//! Initialization logic lives here rather than in main.rs so tests can build
//! the same router against stub collaborators.

pub mod routes;
pub mod server;
pub mod services;

use crate::state::AppState;
use anyhow::Result;
use closet_core::Config;
use std::sync::Arc;

/// Initialize the entire application: identity subsystem, database, storage,
/// collaborator clients, and routes.
pub async fn initialize_app(config: Config) -> Result<(Arc<AppState>, axum::Router)> {
    // Fail closed: a verifier that cannot initialize must surface at startup,
    // not as silent unauthenticated traffic later.
    closet_services::ensure_initialized(&config)
        .map_err(|e| anyhow::anyhow!("Identity verifier initialization failed: {}", e))?;

    let state = services::initialize_services(&config).await?;
    let router = routes::setup_routes(&config, state.clone())?;

    Ok((state, router))
}
