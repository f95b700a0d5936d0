use crate::domain::alert::{NewPriceAlert, PriceAlert};
use crate::domain::errors::PersistenceError;
use crate::domain::market::{AssetClass, Symbol};
use crate::domain::repositories::PriceAlertRepository;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use std::str::FromStr;
use tracing::debug;

const COLUMNS: &str = "id, asset_type, symbol, alert_price, is_active, last_notified_at";

pub struct SqlitePriceAlertRepository {
    pool: SqlitePool,
}

impl SqlitePriceAlertRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

fn corrupt(reason: String) -> PersistenceError {
    PersistenceError::CorruptRow {
        table: "price_alerts",
        reason,
    }
}

fn map_row(row: &SqliteRow) -> Result<PriceAlert, PersistenceError> {
    let decode = PersistenceError::database;

    let id: i64 = row.try_get("id").map_err(decode("price_alerts decode"))?;
    let asset_raw: String = row.try_get("asset_type").map_err(decode("price_alerts decode"))?;
    let symbol_raw: String = row.try_get("symbol").map_err(decode("price_alerts decode"))?;
    let price_raw: String = row.try_get("alert_price").map_err(decode("price_alerts decode"))?;

    let asset_type = AssetClass::from_str(&asset_raw)
        .map_err(|e| corrupt(format!("alert {}: asset_type {:?}: {}", id, asset_raw, e)))?;
    let symbol = Symbol::new(&symbol_raw)
        .map_err(|e| corrupt(format!("alert {}: symbol {:?}: {}", id, symbol_raw, e)))?;
    let alert_price = Decimal::from_str(&price_raw)
        .map_err(|e| corrupt(format!("alert {}: alert_price {:?}: {}", id, price_raw, e)))?;

    Ok(PriceAlert {
        id,
        asset_type,
        symbol,
        alert_price,
        is_active: row.try_get("is_active").map_err(decode("price_alerts decode"))?,
        last_notified_at: row
            .try_get::<Option<DateTime<Utc>>, _>("last_notified_at")
            .map_err(decode("price_alerts decode"))?,
    })
}

#[async_trait]
impl PriceAlertRepository for SqlitePriceAlertRepository {
    async fn find_active(
        &self,
        asset_type: AssetClass,
        symbol: &Symbol,
    ) -> Result<Vec<PriceAlert>, PersistenceError> {
        let sql = format!(
            "SELECT {} FROM price_alerts \
             WHERE LOWER(asset_type) = ? AND UPPER(REPLACE(TRIM(symbol), '/', '')) = ? AND is_active = 1 \
             ORDER BY id",
            COLUMNS
        );
        let rows = sqlx::query(&sql)
            .bind(asset_type.as_str())
            .bind(symbol.as_str())
            .fetch_all(&self.pool)
            .await
            .map_err(PersistenceError::database("price_alerts select"))?;

        rows.iter().map(map_row).collect()
    }

    async fn active_symbols(&self, asset_type: AssetClass) -> Result<Vec<Symbol>, PersistenceError> {
        let rows = sqlx::query(
            "SELECT DISTINCT symbol FROM price_alerts WHERE LOWER(asset_type) = ? AND is_active = 1 ORDER BY symbol",
        )
        .bind(asset_type.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(PersistenceError::database("price_alerts select"))?;

        let mut symbols: Vec<Symbol> = Vec::with_capacity(rows.len());
        for row in rows {
            let raw: String = row
                .try_get("symbol")
                .map_err(PersistenceError::database("price_alerts decode"))?;
            let symbol = Symbol::new(&raw).map_err(|e| corrupt(format!("symbol {:?}: {}", raw, e)))?;
            // Distinct in SQL is case-sensitive; normalized symbols may still collide.
            if !symbols.contains(&symbol) {
                symbols.push(symbol);
            }
        }
        Ok(symbols)
    }

    async fn mark_notified(&self, id: i64, at: DateTime<Utc>) -> Result<(), PersistenceError> {
        sqlx::query("UPDATE price_alerts SET last_notified_at = ? WHERE id = ?")
            .bind(at)
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(PersistenceError::database("price_alerts update"))?;

        debug!("SqlitePriceAlertRepository: Alert {} notified at {}", id, at);
        Ok(())
    }

    async fn create(&self, alert: &NewPriceAlert) -> Result<i64, PersistenceError> {
        let result = sqlx::query(
            r#"
            INSERT INTO price_alerts (asset_type, symbol, alert_price, is_active, last_notified_at, created_at)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(alert.asset_type.as_str())
        .bind(alert.symbol.as_str())
        .bind(alert.alert_price.to_string())
        .bind(alert.is_active)
        .bind(alert.last_notified_at)
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .map_err(PersistenceError::database("price_alerts insert"))?;

        Ok(result.last_insert_rowid())
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<PriceAlert>, PersistenceError> {
        let sql = format!("SELECT {} FROM price_alerts WHERE id = ?", COLUMNS);
        let row = sqlx::query(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(PersistenceError::database("price_alerts select"))?;

        row.as_ref().map(map_row).transpose()
    }
}
