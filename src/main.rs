//! # Instafeed API Main Entry Point
//!
//! This is the main entry point for the Instafeed API service.

use instafeed::{config::ConfigLoader, db::init_pool, logging, server::run_server};
use migration::{Migrator, MigratorTrait};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load configuration from layered env files and variables
    let config_loader = ConfigLoader::new();
    let config = config_loader.load()?;

    logging::init_subscriber(&config);

    tracing::info!(profile = %config.profile, "Loaded configuration");
    if let Ok(redacted_json) = config.redacted_json() {
        tracing::debug!(config = %redacted_json, "Effective configuration");
    }

    let db = init_pool(&config).await?;
    Migrator::up(&db, None).await?;

    run_server(config, db).await
}
