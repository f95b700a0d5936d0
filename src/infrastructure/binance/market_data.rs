//! Binance Market Data Service
//!
//! Primary crypto adapter:
//! - Tradable spot listing (exchangeInfo)
//! - Daily klines
//! - Volume-ranked universe (24hr ticker)
//! - Last prices (ticker/price)

use super::kline::parse_klines;
use crate::config::{RetryPolicy, SourceEnvConfig};
use crate::domain::errors::SourceError;
use crate::domain::market::{BarSeries, BarWindow, Symbol};
use crate::domain::ports::{BarSource, PriceSource, RankedInstrument, UniverseSource};
use crate::infrastructure::core::{HttpClientFactory, build_url, get_json};
use async_trait::async_trait;
use reqwest_middleware::ClientWithMiddleware;
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::Value;
use std::collections::{HashMap, HashSet};
use std::str::FromStr;
use std::time::Duration;
use tracing::{debug, info, warn};

const SOURCE_NAME: &str = "Binance";
/// Upper bound Binance accepts for `limit` on /api/v3/klines.
const MAX_KLINE_LIMIT: u32 = 1000;

fn kline_limit(window: &BarWindow) -> u32 {
    window.limit().min(MAX_KLINE_LIMIT)
}

#[derive(Debug, Deserialize)]
struct SymbolInfo {
    symbol: String,
    status: String,
    #[serde(rename = "baseAsset")]
    base_asset: String,
    #[serde(rename = "quoteAsset")]
    quote_asset: String,
}

#[derive(Debug, Deserialize)]
struct ExchangeInfo {
    symbols: Vec<SymbolInfo>,
}

#[derive(Debug, Deserialize)]
struct Ticker24hr {
    symbol: String,
    #[serde(rename = "quoteVolume")]
    quote_volume: String,
}

#[derive(Debug, Deserialize)]
struct PriceTicker {
    symbol: String,
    price: String,
}

pub struct BinanceMarketDataService {
    client: ClientWithMiddleware,
    base_url: String,
    quote_asset: String,
    bar_timeout: Duration,
    listing_timeout: Duration,
    price_timeout: Duration,
}

impl BinanceMarketDataService {
    pub fn builder() -> BinanceMarketDataServiceBuilder {
        BinanceMarketDataServiceBuilder::default()
    }

    pub fn from_config(sources: &SourceEnvConfig, quote_asset: &str) -> Self {
        Self::builder()
            .base_url(sources.binance_base_url.clone())
            .quote_asset(quote_asset.to_string())
            .timeouts(sources.bar_timeout, sources.listing_timeout, sources.price_timeout)
            .retry(sources.retry)
            .build()
    }

    /// Spot pairs currently `TRADING` against the configured quote asset.
    async fn trading_pairs(&self) -> Result<Vec<SymbolInfo>, SourceError> {
        info!("BinanceMarketDataService: Fetching tradable assets from exchangeInfo");
        let url = build_url::<&str, &str>(SOURCE_NAME, &self.base_url, "/api/v3/exchangeInfo", &[])?;
        let info: ExchangeInfo = get_json(&self.client, SOURCE_NAME, url, &[], self.listing_timeout).await?;

        let pairs: Vec<SymbolInfo> = info
            .symbols
            .into_iter()
            .filter(|s| s.status == "TRADING" && s.quote_asset.eq_ignore_ascii_case(&self.quote_asset))
            .collect();

        info!(
            "BinanceMarketDataService: Found {} tradable {} pairs",
            pairs.len(),
            self.quote_asset
        );
        Ok(pairs)
    }
}

#[derive(Default)]
pub struct BinanceMarketDataServiceBuilder {
    base_url: Option<String>,
    quote_asset: Option<String>,
    timeouts: Option<(Duration, Duration, Duration)>,
    retry: Option<RetryPolicy>,
}

impl BinanceMarketDataServiceBuilder {
    pub fn base_url(mut self, base_url: String) -> Self {
        self.base_url = Some(base_url);
        self
    }

    pub fn quote_asset(mut self, quote_asset: String) -> Self {
        self.quote_asset = Some(quote_asset);
        self
    }

    /// Deadlines for bar, listing and price requests.
    pub fn timeouts(mut self, bars: Duration, listing: Duration, prices: Duration) -> Self {
        self.timeouts = Some((bars, listing, prices));
        self
    }

    pub fn retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = Some(retry);
        self
    }

    pub fn build(self) -> BinanceMarketDataService {
        let defaults = SourceEnvConfig::default();
        let (bar_timeout, listing_timeout, price_timeout) = self.timeouts.unwrap_or((
            defaults.bar_timeout,
            defaults.listing_timeout,
            defaults.price_timeout,
        ));
        let retry = self.retry.unwrap_or_default();
        let attempt_timeout = bar_timeout.max(listing_timeout).max(price_timeout);

        BinanceMarketDataService {
            client: HttpClientFactory::create_client(&retry, attempt_timeout),
            base_url: self.base_url.unwrap_or(defaults.binance_base_url),
            quote_asset: self.quote_asset.unwrap_or_else(|| "USDT".to_string()).to_uppercase(),
            bar_timeout,
            listing_timeout,
            price_timeout,
        }
    }
}

#[async_trait]
impl BarSource for BinanceMarketDataService {
    fn name(&self) -> &str {
        SOURCE_NAME
    }

    async fn list_symbols(&self) -> Result<Vec<Symbol>, SourceError> {
        let pairs = self.trading_pairs().await?;
        Ok(pairs.iter().filter_map(|p| Symbol::new(&p.symbol).ok()).collect())
    }

    async fn get_bars(&self, symbol: &Symbol, window: &BarWindow) -> Result<BarSeries, SourceError> {
        let limit = kline_limit(window).to_string();
        let url = build_url(
            SOURCE_NAME,
            &self.base_url,
            "/api/v3/klines",
            &[("symbol", symbol.as_str()), ("interval", "1d"), ("limit", limit.as_str())],
        )?;

        let rows: Vec<Vec<Value>> = get_json(&self.client, SOURCE_NAME, url, &[], self.bar_timeout).await?;
        let series = parse_klines(SOURCE_NAME, symbol, rows)?;

        debug!(
            "BinanceMarketDataService: Fetched {} bars for {}",
            series.len(),
            symbol
        );
        Ok(series)
    }
}

#[async_trait]
impl UniverseSource for BinanceMarketDataService {
    fn name(&self) -> &str {
        SOURCE_NAME
    }

    /// Tradable pairs ranked by 24h quote volume, highest first.
    async fn ranked_instruments(&self, limit: usize) -> Result<Vec<RankedInstrument>, SourceError> {
        let pairs = self.trading_pairs().await?;
        let base_by_symbol: HashMap<String, String> = pairs
            .into_iter()
            .map(|p| (p.symbol.to_uppercase(), p.base_asset.to_uppercase()))
            .collect();

        let url = build_url::<&str, &str>(SOURCE_NAME, &self.base_url, "/api/v3/ticker/24hr", &[])?;
        let tickers: Vec<Ticker24hr> = get_json(&self.client, SOURCE_NAME, url, &[], self.listing_timeout).await?;

        let mut ranked: Vec<RankedInstrument> = tickers
            .into_iter()
            .filter_map(|t| {
                let base_asset = base_by_symbol.get(&t.symbol.to_uppercase())?.clone();
                let liquidity = Decimal::from_str(&t.quote_volume).ok()?;
                let symbol = Symbol::new(&t.symbol).ok()?;
                Some(RankedInstrument {
                    symbol,
                    base_asset,
                    liquidity,
                })
            })
            .collect();

        ranked.sort_by(|a, b| b.liquidity.cmp(&a.liquidity));
        ranked.truncate(limit);

        info!(
            "BinanceMarketDataService: Ranked {} pairs by 24h quote volume",
            ranked.len()
        );
        Ok(ranked)
    }
}

#[async_trait]
impl PriceSource for BinanceMarketDataService {
    fn name(&self) -> &str {
        SOURCE_NAME
    }

    /// Fetches the full price board once and keeps the requested symbols.
    ///
    /// The multi-symbol filter rejects the whole request when one symbol is
    /// unknown, so the board is filtered locally instead.
    async fn latest_prices(&self, symbols: &[Symbol]) -> Result<HashMap<Symbol, Decimal>, SourceError> {
        if symbols.is_empty() {
            return Ok(HashMap::new());
        }

        let wanted: HashSet<&Symbol> = symbols.iter().collect();
        let url = build_url::<&str, &str>(SOURCE_NAME, &self.base_url, "/api/v3/ticker/price", &[])?;
        let tickers: Vec<PriceTicker> = get_json(&self.client, SOURCE_NAME, url, &[], self.price_timeout).await?;

        let mut prices = HashMap::new();
        for ticker in tickers {
            let Ok(symbol) = Symbol::new(&ticker.symbol) else {
                continue;
            };
            if !wanted.contains(&symbol) {
                continue;
            }
            match Decimal::from_str(&ticker.price) {
                Ok(price) => {
                    prices.insert(symbol, price);
                }
                Err(e) => warn!(
                    "BinanceMarketDataService: Unparseable price {:?} for {}: {}",
                    ticker.price, symbol, e
                ),
            }
        }

        for symbol in symbols {
            if !prices.contains_key(symbol) {
                debug!("BinanceMarketDataService: No price for {}", symbol);
            }
        }

        Ok(prices)
    }
}
