//! Repository Pattern Abstractions
//!
//! Storage seams for the two persisted tables:
//! - `WatchlistRepository`: wholesale-replaceable watchlist
//! - `PriceAlertRepository`: alert thresholds and their notification timestamps

use crate::domain::alert::{NewPriceAlert, PriceAlert};
use crate::domain::errors::PersistenceError;
use crate::domain::market::{AssetClass, Symbol};
use crate::domain::watchlist::WatchlistEntry;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

#[async_trait]
pub trait WatchlistRepository: Send + Sync {
    /// Atomically replace the whole watchlist with `entries`.
    ///
    /// On error the previous content is left untouched.
    async fn replace_all(&self, entries: &[WatchlistEntry]) -> Result<(), PersistenceError>;

    /// All rows, ordered by symbol.
    async fn get_all(&self) -> Result<Vec<WatchlistEntry>, PersistenceError>;
}

#[async_trait]
pub trait PriceAlertRepository: Send + Sync {
    async fn find_active(
        &self,
        asset_type: AssetClass,
        symbol: &Symbol,
    ) -> Result<Vec<PriceAlert>, PersistenceError>;

    /// Distinct symbols with at least one active alert.
    async fn active_symbols(&self, asset_type: AssetClass) -> Result<Vec<Symbol>, PersistenceError>;

    async fn mark_notified(&self, id: i64, at: DateTime<Utc>) -> Result<(), PersistenceError>;

    async fn create(&self, alert: &NewPriceAlert) -> Result<i64, PersistenceError>;

    async fn find_by_id(&self, id: i64) -> Result<Option<PriceAlert>, PersistenceError>;
}
