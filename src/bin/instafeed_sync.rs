//! Scheduled sync entry point.
//!
//! Invoked from cron (or any scheduler): executes one orchestrator run
//! across all stored connections and exits. Per-connection failures are
//! captured in the run report and logged; only a top-level failure (such
//! as being unable to load the connection set) produces a non-zero exit.

use std::sync::Arc;

use instafeed::{
    config::ConfigLoader, db::init_pool, instagram::InstagramClient, logging,
    orchestrator::SyncOrchestrator,
};
use tracing::{error, info};

#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        error!(error = %format!("{err:#}"), "Sync run failed");
        eprintln!("Sync run failed: {err:#}");
        std::process::exit(1);
    }
}

async fn run() -> anyhow::Result<()> {
    let config = ConfigLoader::new().load()?;
    logging::init_subscriber(&config);

    let db = init_pool(&config).await?;
    let client = InstagramClient::from_config(&config);
    let orchestrator = SyncOrchestrator::new(Arc::new(db), client, &config.sync);

    let report = orchestrator.run().await?;

    info!(
        total_shops = report.total_shops,
        success_count = report.success_count,
        fail_count = report.fail_count,
        duration_ms = report.duration,
        "Cron finished: {}",
        report.summary()
    );
    for result in &report.results {
        info!(shop = %result.shop, outcome = ?result.outcome, "Shop result");
    }

    Ok(())
}
