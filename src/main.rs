//! Engine entry point: loads configuration, opens the store, and runs the
//! weekly rollover scheduler.

use dotenvy::dotenv;
use envelope_ledger::{
    config::{database, settings},
    errors::Result,
    scheduler,
};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing as early as possible
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // .env is optional; env vars can be set externally
    dotenv().ok();

    let app_config = settings::load_app_configuration()
        .inspect(|_| info!("Successfully processed application configuration."))
        .inspect_err(|e| error!("Failed to load application configuration: {e}"))?;

    let db = database::create_connection(&app_config.database_url)
        .await
        .inspect(|_| info!("Database connection established."))
        .inspect_err(|e| error!("Failed to connect to database: {e}"))?;

    database::create_tables(&db)
        .await
        .inspect(|_| info!("Database schema ready."))
        .inspect_err(|e| error!("Failed to initialize database schema: {e}"))?;

    scheduler::run_rollover_loop(db, app_config.scheduler).await;

    Ok(())
}
