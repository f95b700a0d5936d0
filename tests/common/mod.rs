#![allow(dead_code)]

use async_trait::async_trait;
use peakwatch::domain::errors::{NotificationError, SourceError};
use peakwatch::domain::market::{Bar, BarSeries, BarWindow, Symbol};
use peakwatch::domain::ports::{AthFeed, BarSource, NotificationSink, PriceSource, RankedInstrument, UniverseSource};
use peakwatch::infrastructure::persistence::Database;
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use tempfile::TempDir;

/// Fresh on-disk database. Keep the `TempDir` alive for the test's duration.
pub async fn temp_database() -> (TempDir, Database) {
    let dir = tempfile::tempdir().expect("tempdir");
    let url = format!("sqlite://{}/peakwatch.db", dir.path().display());
    let db = Database::new(&url, 2).await.expect("database");
    (dir, db)
}

pub fn symbol(raw: &str) -> Symbol {
    Symbol::new(raw).unwrap()
}

/// Single daily bar per entry: `(high, close)`.
pub fn series(raw: &str, points: &[(i64, i64)]) -> BarSeries {
    let bars = points
        .iter()
        .enumerate()
        .map(|(i, (high, close))| Bar {
            timestamp: i as i64 * 86_400_000,
            open: Decimal::from(*close),
            high: Decimal::from(*high),
            low: Decimal::from(*close),
            close: Decimal::from(*close),
            volume: Decimal::ONE,
        })
        .collect();
    BarSeries::new(symbol(raw), bars)
}

/// Bar source with canned series, canned panics and a call counter.
/// Unknown symbols answer like an exchange rejecting an unlisted pair.
pub struct MockBarSource {
    pub name: &'static str,
    pub series: HashMap<String, Vec<(i64, i64)>>,
    pub listed: Option<Vec<String>>,
    pub panic_on: Vec<String>,
    pub calls: AtomicUsize,
}

impl MockBarSource {
    pub fn new(name: &'static str, entries: &[(&str, Vec<(i64, i64)>)]) -> Self {
        Self {
            name,
            series: entries.iter().map(|(s, p)| (s.to_string(), p.clone())).collect(),
            listed: None,
            panic_on: Vec::new(),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn with_listing(mut self, symbols: &[&str]) -> Self {
        self.listed = Some(symbols.iter().map(|s| s.to_string()).collect());
        self
    }

    pub fn panicking_on(mut self, raw: &str) -> Self {
        self.panic_on.push(raw.to_string());
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl BarSource for MockBarSource {
    fn name(&self) -> &str {
        self.name
    }

    async fn list_symbols(&self) -> Result<Vec<Symbol>, SourceError> {
        match &self.listed {
            Some(listed) => Ok(listed.iter().map(|s| symbol(s)).collect()),
            None => Err(SourceError::Unsupported {
                source_name: self.name.to_string(),
                operation: "list_symbols",
            }),
        }
    }

    async fn get_bars(&self, symbol: &Symbol, _window: &BarWindow) -> Result<BarSeries, SourceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.panic_on.iter().any(|p| p == symbol.as_str()) {
            panic!("malformed payload for {}", symbol);
        }
        match self.series.get(symbol.as_str()) {
            Some(points) => Ok(series(symbol.as_str(), points)),
            None => Err(SourceError::Status {
                source_name: self.name.to_string(),
                status: 400,
                body: "Invalid symbol.".to_string(),
            }),
        }
    }
}

/// Universe source returning `(symbol, base, liquidity)` rows, or failing.
pub struct MockUniverse {
    pub name: &'static str,
    pub rows: Vec<(String, String, i64)>,
    pub fail: bool,
}

impl MockUniverse {
    pub fn new(name: &'static str, rows: &[(&str, &str, i64)]) -> Self {
        Self {
            name,
            rows: rows
                .iter()
                .map(|(s, b, l)| (s.to_string(), b.to_string(), *l))
                .collect(),
            fail: false,
        }
    }

    pub fn failing(name: &'static str) -> Self {
        Self {
            name,
            rows: Vec::new(),
            fail: true,
        }
    }
}

#[async_trait]
impl UniverseSource for MockUniverse {
    fn name(&self) -> &str {
        self.name
    }

    async fn ranked_instruments(&self, limit: usize) -> Result<Vec<RankedInstrument>, SourceError> {
        if self.fail {
            return Err(SourceError::Transport {
                source_name: self.name.to_string(),
                reason: "connection reset".to_string(),
            });
        }
        Ok(self
            .rows
            .iter()
            .take(limit)
            .map(|(s, b, l)| RankedInstrument {
                symbol: symbol(s),
                base_asset: b.clone(),
                liquidity: Decimal::from(*l),
            })
            .collect())
    }
}

pub struct MockAthFeed {
    pub rows: Vec<(String, String)>,
}

impl MockAthFeed {
    pub fn new(rows: &[(&str, &str)]) -> Self {
        Self {
            rows: rows.iter().map(|(s, b)| (s.to_string(), b.to_string())).collect(),
        }
    }
}

#[async_trait]
impl AthFeed for MockAthFeed {
    fn name(&self) -> &str {
        "mock-ath"
    }

    async fn near_ath(&self, _limit: usize) -> Result<Vec<RankedInstrument>, SourceError> {
        Ok(self
            .rows
            .iter()
            .map(|(s, b)| RankedInstrument {
                symbol: symbol(s),
                base_asset: b.clone(),
                liquidity: Decimal::ZERO,
            })
            .collect())
    }
}

#[derive(Default)]
pub struct MockPrices {
    pub prices: HashMap<Symbol, Decimal>,
}

impl MockPrices {
    pub fn new(entries: &[(&str, Decimal)]) -> Self {
        Self {
            prices: entries.iter().map(|(s, p)| (symbol(s), *p)).collect(),
        }
    }
}

#[async_trait]
impl PriceSource for MockPrices {
    fn name(&self) -> &str {
        "mock-prices"
    }

    async fn latest_prices(&self, symbols: &[Symbol]) -> Result<HashMap<Symbol, Decimal>, SourceError> {
        Ok(symbols
            .iter()
            .filter_map(|s| self.prices.get(s).map(|p| (s.clone(), *p)))
            .collect())
    }
}

#[derive(Default)]
pub struct RecordingSink {
    pub sent: Mutex<Vec<String>>,
}

impl RecordingSink {
    pub fn messages(&self) -> Vec<String> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl NotificationSink for RecordingSink {
    async fn send(&self, text: &str) -> Result<(), NotificationError> {
        self.sent.lock().unwrap().push(text.to_string());
        Ok(())
    }
}
