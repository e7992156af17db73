mod error;
mod handlers;
mod pipeline;
mod setup;
mod state;
mod telemetry;

use closet_core::Config;

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    // Load .env before reading configuration
    dotenvy::dotenv().ok();
    let config = Config::from_env()?;

    telemetry::init_telemetry(config.is_production());

    // Initialize the application (identity subsystem, database, services, routes)
    let (_state, router) = setup::initialize_app(config.clone()).await?;

    // Start the server
    setup::server::start_server(&config, router).await?;

    Ok(())
}
