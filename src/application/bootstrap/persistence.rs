use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::info;

use crate::config::DatabaseEnvConfig;
use crate::domain::repositories::{PriceAlertRepository, WatchlistRepository};
use crate::infrastructure::persistence::database::Database;
use crate::infrastructure::persistence::repositories::{SqlitePriceAlertRepository, SqliteWatchlistRepository};

pub struct PersistenceHandle {
    pub db: Database,
    pub watchlist_repository: Arc<dyn WatchlistRepository>,
    pub price_alert_repository: Arc<dyn PriceAlertRepository>,
}

pub struct PersistenceBootstrap;

impl PersistenceBootstrap {
    pub async fn init(config: &DatabaseEnvConfig) -> Result<PersistenceHandle> {
        info!("Initializing Database at {}", config.url);

        let db = Database::from_config(config)
            .await
            .context("Failed to initialize database")?;

        let watchlist_repository = Arc::new(SqliteWatchlistRepository::new(db.pool.clone()));
        let price_alert_repository = Arc::new(SqlitePriceAlertRepository::new(db.pool.clone()));

        Ok(PersistenceHandle {
            db,
            watchlist_repository,
            price_alert_repository,
        })
    }
}
