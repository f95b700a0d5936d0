use crate::domain::errors::{NotificationError, SourceError};
use crate::domain::market::{BarSeries, BarWindow, Symbol};
use async_trait::async_trait;
use rust_decimal::Decimal;
use std::collections::HashMap;

/// Instrument as ranked by a universe source, before exclusion filtering.
#[derive(Debug, Clone, PartialEq)]
pub struct RankedInstrument {
    pub symbol: Symbol,
    pub base_asset: String,
    /// Market capitalization or traded volume, whichever the source ranks by.
    pub liquidity: Decimal,
}

/// Historical bar provider for one asset class.
#[async_trait]
pub trait BarSource: Send + Sync {
    fn name(&self) -> &str;

    /// Symbols currently tradable on this source.
    async fn list_symbols(&self) -> Result<Vec<Symbol>, SourceError> {
        Err(SourceError::Unsupported {
            source_name: self.name().to_string(),
            operation: "list_symbols",
        })
    }

    async fn get_bars(&self, symbol: &Symbol, window: &BarWindow) -> Result<BarSeries, SourceError>;
}

/// Ranked listing of the most liquid instruments.
#[async_trait]
pub trait UniverseSource: Send + Sync {
    fn name(&self) -> &str;

    async fn ranked_instruments(&self, limit: usize) -> Result<Vec<RankedInstrument>, SourceError>;
}

/// Global feed of instruments trading at or near their all-time high.
#[async_trait]
pub trait AthFeed: Send + Sync {
    fn name(&self) -> &str;

    /// Instruments within the feed's ATH tolerance, as ranked by the feed.
    async fn near_ath(&self, limit: usize) -> Result<Vec<RankedInstrument>, SourceError>;
}

/// Live price lookup.
#[async_trait]
pub trait PriceSource: Send + Sync {
    fn name(&self) -> &str;

    async fn latest_prices(&self, symbols: &[Symbol]) -> Result<HashMap<Symbol, Decimal>, SourceError>;
}

/// Outbound messaging sink.
#[async_trait]
pub trait NotificationSink: Send + Sync {
    async fn send(&self, text: &str) -> Result<(), NotificationError>;
}
