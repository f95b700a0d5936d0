//! Alpaca Market Data Service
//!
//! Primary stock adapter: daily bars, most-active screener and latest trades.

use super::common::{AlpacaBar, SOURCE_NAME};
use crate::config::SourceEnvConfig;
use crate::domain::errors::SourceError;
use crate::domain::market::{BarSeries, BarWindow, Symbol};
use crate::domain::ports::{BarSource, PriceSource, RankedInstrument, UniverseSource};
use crate::infrastructure::core::{HttpClientFactory, build_url, get_json};
use async_trait::async_trait;
use chrono::SecondsFormat;
use reqwest_middleware::ClientWithMiddleware;
use rust_decimal::Decimal;
use rust_decimal::prelude::FromPrimitive;
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;
use tracing::{debug, info, warn};

/// The screener caps `top` at 100.
const MAX_MOST_ACTIVES: usize = 100;

#[derive(Debug, Deserialize)]
struct BarsResponse {
    #[serde(default)]
    bars: Option<Vec<AlpacaBar>>,
}

#[derive(Debug, Deserialize)]
struct MostActive {
    symbol: String,
    volume: f64,
}

#[derive(Debug, Deserialize)]
struct MostActivesResponse {
    most_actives: Vec<MostActive>,
}

#[derive(Debug, Deserialize)]
struct LatestTrade {
    #[serde(rename = "p")]
    price: f64,
}

#[derive(Debug, Deserialize)]
struct LatestTradesResponse {
    trades: HashMap<String, LatestTrade>,
}

pub struct AlpacaMarketDataService {
    client: ClientWithMiddleware,
    api_key: String,
    api_secret: String,
    data_base_url: String,
    bar_timeout: Duration,
    listing_timeout: Duration,
    price_timeout: Duration,
}

impl AlpacaMarketDataService {
    pub fn from_config(sources: &SourceEnvConfig) -> Self {
        let attempt_timeout = sources.bar_timeout.max(sources.listing_timeout);
        Self {
            client: HttpClientFactory::create_client(&sources.retry, attempt_timeout),
            api_key: sources.alpaca_api_key.clone(),
            api_secret: sources.alpaca_secret_key.clone(),
            data_base_url: sources.alpaca_data_url.clone(),
            bar_timeout: sources.bar_timeout,
            listing_timeout: sources.listing_timeout,
            price_timeout: sources.price_timeout,
        }
    }

    fn auth_headers(&self) -> [(&str, &str); 2] {
        [
            ("APCA-API-KEY-ID", self.api_key.as_str()),
            ("APCA-API-SECRET-KEY", self.api_secret.as_str()),
        ]
    }
}

#[async_trait]
impl BarSource for AlpacaMarketDataService {
    fn name(&self) -> &str {
        SOURCE_NAME
    }

    async fn get_bars(&self, symbol: &Symbol, window: &BarWindow) -> Result<BarSeries, SourceError> {
        let start = window.start().to_rfc3339_opts(SecondsFormat::Secs, true);
        let limit = window.limit().to_string();
        let path = format!("/v2/stocks/{}/bars", symbol);
        let url = build_url(
            SOURCE_NAME,
            &self.data_base_url,
            &path,
            &[
                ("timeframe", "1Day"),
                ("start", start.as_str()),
                ("limit", limit.as_str()),
                ("adjustment", "split"),
            ],
        )?;

        let response: BarsResponse =
            get_json(&self.client, SOURCE_NAME, url, &self.auth_headers(), self.bar_timeout).await?;

        let raw = response.bars.unwrap_or_default();
        if raw.is_empty() {
            return Err(SourceError::empty(SOURCE_NAME, format!("bars for {}", symbol)));
        }
        let bars = raw.iter().map(AlpacaBar::to_bar).collect::<Result<Vec<_>, _>>()?;

        debug!("AlpacaMarketDataService: Fetched {} bars for {}", bars.len(), symbol);
        Ok(BarSeries::new(symbol.clone(), bars))
    }
}

#[async_trait]
impl UniverseSource for AlpacaMarketDataService {
    fn name(&self) -> &str {
        SOURCE_NAME
    }

    async fn ranked_instruments(&self, limit: usize) -> Result<Vec<RankedInstrument>, SourceError> {
        let top = limit.clamp(1, MAX_MOST_ACTIVES).to_string();
        let url = build_url(
            SOURCE_NAME,
            &self.data_base_url,
            "/v1beta1/screener/stocks/most-actives",
            &[("by", "volume"), ("top", top.as_str())],
        )?;

        let response: MostActivesResponse =
            get_json(&self.client, SOURCE_NAME, url, &self.auth_headers(), self.listing_timeout).await?;

        let mut ranked: Vec<RankedInstrument> = response
            .most_actives
            .into_iter()
            .filter_map(|active| {
                let symbol = Symbol::new(&active.symbol).ok()?;
                Some(RankedInstrument {
                    base_asset: symbol.as_str().to_string(),
                    symbol,
                    liquidity: Decimal::from_f64(active.volume).unwrap_or(Decimal::ZERO),
                })
            })
            .collect();

        ranked.sort_by(|a, b| b.liquidity.cmp(&a.liquidity));
        ranked.truncate(limit);

        info!("AlpacaMarketDataService: Screener returned {} most-active stocks", ranked.len());
        Ok(ranked)
    }
}

#[async_trait]
impl PriceSource for AlpacaMarketDataService {
    fn name(&self) -> &str {
        SOURCE_NAME
    }

    async fn latest_prices(&self, symbols: &[Symbol]) -> Result<HashMap<Symbol, Decimal>, SourceError> {
        if symbols.is_empty() {
            return Ok(HashMap::new());
        }

        let joined = symbols.iter().map(Symbol::as_str).collect::<Vec<_>>().join(",");
        let url = build_url(
            SOURCE_NAME,
            &self.data_base_url,
            "/v2/stocks/trades/latest",
            &[("symbols", joined.as_str())],
        )?;

        let response: LatestTradesResponse =
            get_json(&self.client, SOURCE_NAME, url, &self.auth_headers(), self.price_timeout).await?;

        let mut prices = HashMap::new();
        for (raw_symbol, trade) in response.trades {
            let Ok(symbol) = Symbol::new(&raw_symbol) else {
                continue;
            };
            match Decimal::from_f64(trade.price) {
                Some(price) => {
                    prices.insert(symbol, price);
                }
                None => warn!(
                    "AlpacaMarketDataService: Non-finite trade price for {}",
                    symbol
                ),
            }
        }
        Ok(prices)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bars_response_with_null_bars() {
        let response: BarsResponse =
            serde_json::from_str(r#"{"bars": null, "symbol": "ZZZZ", "next_page_token": null}"#).unwrap();
        assert!(response.bars.is_none());
    }

    #[test]
    fn test_latest_trades_deserialization() {
        let payload = r#"{"trades": {"AAPL": {"t": "2024-01-03T20:59:59Z", "p": 184.25, "s": 100}}}"#;
        let response: LatestTradesResponse = serde_json::from_str(payload).unwrap();
        assert_eq!(response.trades["AAPL"].price, 184.25);
    }

    #[test]
    fn test_most_actives_deserialization() {
        let payload = r#"{"most_actives": [{"symbol": "NVDA", "volume": 512345678, "trade_count": 10}], "last_updated": "x"}"#;
        let response: MostActivesResponse = serde_json::from_str(payload).unwrap();
        assert_eq!(response.most_actives[0].symbol, "NVDA");
    }
}
