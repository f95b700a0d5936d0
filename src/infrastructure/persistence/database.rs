use crate::config::DatabaseEnvConfig;
use anyhow::{Context, Result};

use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::path::Path;
use std::str::FromStr;
use tokio::fs;
use tracing::info;

#[derive(Clone)]
pub struct Database {
    pub pool: SqlitePool,
}

impl Database {
    pub async fn new(db_url: &str, max_connections: u32) -> Result<Self> {
        // Ensure the directory exists if it's a file path
        if let Some(path_part) = db_url.strip_prefix("sqlite://") {
            let path = Path::new(path_part);
            if let Some(parent) = path.parent()
                && !parent.as_os_str().is_empty()
                && !parent.exists()
            {
                fs::create_dir_all(parent)
                    .await
                    .context("Failed to create database directory")?;
            }
        }

        let options = SqliteConnectOptions::from_str(db_url)
            .with_context(|| format!("Invalid database URL: {}", db_url))?
            .create_if_missing(true)
            .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal);

        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect_with(options)
            .await
            .context("Failed to connect to SQLite database")?;

        info!("Connected to database: {}", db_url);

        let db = Self { pool };
        db.init().await?;

        Ok(db)
    }

    pub async fn from_config(config: &DatabaseEnvConfig) -> Result<Self> {
        Self::new(&config.url, config.max_connections).await
    }

    /// Initialize database schema
    async fn init(&self) -> Result<()> {
        let mut conn = self.pool.acquire().await?;

        // 1. Watchlist: the evaluated set of the last completed scan
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS watchlist (
                symbol TEXT PRIMARY KEY,
                is_ath BOOLEAN NOT NULL DEFAULT 0,
                updated_at DATETIME NOT NULL
            );
            "#,
        )
        .execute(&mut *conn)
        .await
        .context("Failed to create watchlist table")?;

        // 2. Price alerts. Rows are written by operators; scans only touch last_notified_at.
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS price_alerts (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                asset_type TEXT NOT NULL,
                symbol TEXT NOT NULL,
                alert_price TEXT NOT NULL,
                is_active BOOLEAN NOT NULL DEFAULT 1,
                last_notified_at DATETIME,
                created_at DATETIME NOT NULL DEFAULT CURRENT_TIMESTAMP
            );
            "#,
        )
        .execute(&mut *conn)
        .await
        .context("Failed to create price_alerts table")?;

        sqlx::query(
            r#"
            CREATE INDEX IF NOT EXISTS idx_price_alerts_lookup
            ON price_alerts (asset_type, symbol, is_active);
            "#,
        )
        .execute(&mut *conn)
        .await
        .context("Failed to create price_alerts index")?;

        Ok(())
    }
}
