use std::error::Error;
use std::sync::Arc;

use sea_orm::Database;
use tracing::{error, info};

use sitemon::alerting::dispatcher::AlertDispatcher;
use sitemon::config::AppConfig;
use sitemon::db::store::{DbStore, MonitorStore};
use sitemon::logging;
use sitemon::monitor::scheduler::MonitorScheduler;

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    dotenv::dotenv().ok();
    logging::init();

    let config = match AppConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!(error = %e, "Critical error loading configuration. Exiting.");
            return Err(e.into());
        }
    };

    let db = Database::connect(&config.database_url).await?;
    let store: Arc<dyn MonitorStore> = Arc::new(DbStore::new(db));
    let dispatcher = Arc::new(AlertDispatcher::new(store.clone()));
    let scheduler = Arc::new(MonitorScheduler::new(store, dispatcher));

    // Resume polling for every persisted website before anything else runs.
    let installed = scheduler.bootstrap().await?;
    info!(websites = installed, "Monitoring scheduler running.");

    tokio::signal::ctrl_c().await?;
    info!("Shutdown signal received. Exiting.");
    Ok(())
}
