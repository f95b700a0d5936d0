use crate::domain::errors::PersistenceError;
use crate::domain::market::Symbol;
use crate::domain::repositories::WatchlistRepository;
use crate::domain::watchlist::WatchlistEntry;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{QueryBuilder, Row, Sqlite, SqliteConnection, SqlitePool};
use tracing::{info, warn};

/// Rows per INSERT statement; three bound parameters each stays under SQLite's
/// default host-parameter limit.
const INSERT_CHUNK: usize = 300;

pub struct SqliteWatchlistRepository {
    pool: SqlitePool,
}

impl SqliteWatchlistRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

async fn delete_and_insert(conn: &mut SqliteConnection, entries: &[WatchlistEntry]) -> Result<(), PersistenceError> {
    sqlx::query("DELETE FROM watchlist")
        .execute(&mut *conn)
        .await
        .map_err(PersistenceError::database("watchlist delete"))?;

    for chunk in entries.chunks(INSERT_CHUNK) {
        let mut qb: QueryBuilder<Sqlite> = QueryBuilder::new("INSERT INTO watchlist (symbol, is_ath, updated_at) ");
        qb.push_values(chunk, |mut b, entry| {
            b.push_bind(entry.symbol.as_str())
                .push_bind(entry.is_ath)
                .push_bind(entry.updated_at);
        });
        qb.push(" ON CONFLICT(symbol) DO UPDATE SET is_ath = excluded.is_ath, updated_at = excluded.updated_at");

        qb.build()
            .execute(&mut *conn)
            .await
            .map_err(PersistenceError::database("watchlist insert"))?;
    }

    Ok(())
}

#[async_trait]
impl WatchlistRepository for SqliteWatchlistRepository {
    async fn replace_all(&self, entries: &[WatchlistEntry]) -> Result<(), PersistenceError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(PersistenceError::database("watchlist begin"))?;

        if let Err(e) = delete_and_insert(&mut *tx, entries).await {
            warn!("SqliteWatchlistRepository: Replace failed, rolling back: {}", e);
            tx.rollback()
                .await
                .map_err(PersistenceError::database("watchlist rollback"))?;
            return Err(e);
        }

        tx.commit()
            .await
            .map_err(PersistenceError::database("watchlist commit"))?;

        info!("SqliteWatchlistRepository: Replaced watchlist with {} entries", entries.len());
        Ok(())
    }

    async fn get_all(&self) -> Result<Vec<WatchlistEntry>, PersistenceError> {
        let rows = sqlx::query("SELECT symbol, is_ath, updated_at FROM watchlist ORDER BY symbol ASC")
            .fetch_all(&self.pool)
            .await
            .map_err(PersistenceError::database("watchlist select"))?;

        let mut entries = Vec::with_capacity(rows.len());
        for row in rows {
            let raw_symbol: String = row
                .try_get("symbol")
                .map_err(PersistenceError::database("watchlist decode"))?;
            let symbol = Symbol::new(&raw_symbol).map_err(|e| PersistenceError::CorruptRow {
                table: "watchlist",
                reason: format!("symbol {:?}: {}", raw_symbol, e),
            })?;
            let is_ath: bool = row
                .try_get("is_ath")
                .map_err(PersistenceError::database("watchlist decode"))?;
            let updated_at: DateTime<Utc> = row
                .try_get("updated_at")
                .map_err(PersistenceError::database("watchlist decode"))?;

            entries.push(WatchlistEntry {
                symbol,
                is_ath,
                updated_at,
            });
        }
        Ok(entries)
    }
}
