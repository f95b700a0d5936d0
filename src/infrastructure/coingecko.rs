//! CoinGecko market listing: primary crypto universe and near-ATH feed.

use crate::config::{RetryPolicy, SourceEnvConfig};
use crate::domain::errors::SourceError;
use crate::domain::market::Symbol;
use crate::domain::ports::{AthFeed, RankedInstrument, UniverseSource};
use crate::infrastructure::core::{HttpClientFactory, build_url, get_json};
use async_trait::async_trait;
use reqwest_middleware::ClientWithMiddleware;
use rust_decimal::Decimal;
use rust_decimal::prelude::FromPrimitive;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, info};

const SOURCE_NAME: &str = "CoinGecko";
/// Largest `per_page` the markets endpoint accepts.
pub const MAX_PAGE_SIZE: usize = 250;

#[derive(Debug, Deserialize)]
struct CoinMarket {
    symbol: String,
    #[serde(default)]
    market_cap: Option<f64>,
    #[serde(default)]
    ath_change_percentage: Option<f64>,
}

pub struct CoinGeckoClient {
    client: ClientWithMiddleware,
    base_url: String,
    quote_asset: String,
    /// Fraction below the ATH still classified as near-ATH (0.05 = within 5%).
    ath_tolerance: Decimal,
    timeout: Duration,
}

impl CoinGeckoClient {
    pub fn new(
        base_url: String,
        quote_asset: &str,
        ath_tolerance: Decimal,
        timeout: Duration,
        retry: &RetryPolicy,
    ) -> Self {
        Self {
            client: HttpClientFactory::create_client(retry, timeout),
            base_url,
            quote_asset: quote_asset.to_uppercase(),
            ath_tolerance,
            timeout,
        }
    }

    pub fn from_config(sources: &SourceEnvConfig, quote_asset: &str, ath_tolerance: Decimal) -> Self {
        Self::new(
            sources.coingecko_base_url.clone(),
            quote_asset,
            ath_tolerance,
            sources.listing_timeout,
            &sources.retry,
        )
    }

    async fn markets(&self, per_page: usize) -> Result<Vec<CoinMarket>, SourceError> {
        let per_page = per_page.clamp(1, MAX_PAGE_SIZE).to_string();
        let url = build_url(
            SOURCE_NAME,
            &self.base_url,
            "/api/v3/coins/markets",
            &[
                ("vs_currency", "usd"),
                ("order", "market_cap_desc"),
                ("per_page", per_page.as_str()),
                ("page", "1"),
                ("sparkline", "false"),
            ],
        )?;
        get_json(&self.client, SOURCE_NAME, url, &[], self.timeout).await
    }

    /// `ath_change_percentage` is negative below the ATH: -3.2 means 3.2% under.
    fn is_near_ath(&self, ath_change_percentage: f64) -> bool {
        let Some(change) = Decimal::from_f64(ath_change_percentage) else {
            return false;
        };
        change > -(self.ath_tolerance * Decimal::ONE_HUNDRED)
    }

    fn pair_symbol(&self, coin_symbol: &str) -> Option<(Symbol, String)> {
        let base = coin_symbol.trim().to_uppercase();
        if base.is_empty() {
            return None;
        }
        let symbol = Symbol::pair(&base, &self.quote_asset).ok()?;
        Some((symbol, base))
    }
}

#[async_trait]
impl UniverseSource for CoinGeckoClient {
    fn name(&self) -> &str {
        SOURCE_NAME
    }

    /// Coins ranked by market cap, paired with the configured quote asset.
    async fn ranked_instruments(&self, limit: usize) -> Result<Vec<RankedInstrument>, SourceError> {
        let coins = self.markets(limit).await?;

        let mut ranked: Vec<RankedInstrument> = coins
            .into_iter()
            .filter_map(|coin| {
                let (symbol, base_asset) = self.pair_symbol(&coin.symbol)?;
                let liquidity = coin.market_cap.and_then(Decimal::from_f64).unwrap_or(Decimal::ZERO);
                Some(RankedInstrument {
                    symbol,
                    base_asset,
                    liquidity,
                })
            })
            .collect();

        ranked.sort_by(|a, b| b.liquidity.cmp(&a.liquidity));
        ranked.truncate(limit);

        info!("CoinGeckoClient: Got {} coins ranked by market cap", ranked.len());
        Ok(ranked)
    }
}

#[async_trait]
impl AthFeed for CoinGeckoClient {
    fn name(&self) -> &str {
        SOURCE_NAME
    }

    async fn near_ath(&self, limit: usize) -> Result<Vec<RankedInstrument>, SourceError> {
        let coins = self.markets(limit).await?;

        let instruments: Vec<RankedInstrument> = coins
            .into_iter()
            .filter(|coin| coin.ath_change_percentage.is_some_and(|pct| self.is_near_ath(pct)))
            .filter_map(|coin| {
                let (symbol, base_asset) = self.pair_symbol(&coin.symbol)?;
                Some(RankedInstrument {
                    symbol,
                    base_asset,
                    liquidity: coin.market_cap.and_then(Decimal::from_f64).unwrap_or(Decimal::ZERO),
                })
            })
            .collect();

        debug!("CoinGeckoClient: {} coins within ATH tolerance", instruments.len());
        Ok(instruments)
    }
}
