//! MEXC spot klines, used as the secondary crypto bar source.
//!
//! MEXC pages by time range rather than by count, and its kline rows share
//! Binance's positional layout.

use crate::config::{RetryPolicy, SourceEnvConfig};
use crate::domain::errors::SourceError;
use crate::domain::market::{BarSeries, BarWindow, Symbol};
use crate::domain::ports::BarSource;
use crate::infrastructure::binance::kline::parse_klines;
use crate::infrastructure::core::{HttpClientFactory, build_url, get_json};
use async_trait::async_trait;
use reqwest_middleware::ClientWithMiddleware;
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

const SOURCE_NAME: &str = "MEXC";
/// Largest page MEXC serves per klines request.
const MAX_LIMIT: u32 = 1000;

pub struct MexcMarketDataService {
    client: ClientWithMiddleware,
    base_url: String,
    timeout: Duration,
}

impl MexcMarketDataService {
    pub fn new(base_url: String, timeout: Duration, retry: &RetryPolicy) -> Self {
        Self {
            client: HttpClientFactory::create_client(retry, timeout),
            base_url,
            timeout,
        }
    }

    pub fn from_config(sources: &SourceEnvConfig) -> Self {
        Self::new(sources.mexc_base_url.clone(), sources.bar_timeout, &sources.retry)
    }
}

#[async_trait]
impl BarSource for MexcMarketDataService {
    fn name(&self) -> &str {
        SOURCE_NAME
    }

    async fn get_bars(&self, symbol: &Symbol, window: &BarWindow) -> Result<BarSeries, SourceError> {
        let start_ms = window.start().timestamp_millis().to_string();
        let end_ms = window.end.timestamp_millis().to_string();
        let limit = window.limit().min(MAX_LIMIT).to_string();

        let url = build_url(
            SOURCE_NAME,
            &self.base_url,
            "/api/v3/klines",
            &[
                ("symbol", symbol.as_str()),
                ("interval", "1d"),
                ("startTime", start_ms.as_str()),
                ("endTime", end_ms.as_str()),
                ("limit", limit.as_str()),
            ],
        )?;

        let rows: Vec<Vec<Value>> = get_json(&self.client, SOURCE_NAME, url, &[], self.timeout).await?;
        let series = parse_klines(SOURCE_NAME, symbol, rows)?;

        debug!("MexcMarketDataService: Fetched {} bars for {}", series.len(), symbol);
        Ok(series)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_list_symbols_is_unsupported() {
        let service = MexcMarketDataService::new(
            "http://localhost:1".to_string(),
            Duration::from_secs(1),
            &RetryPolicy::no_retry(),
        );
        let err = service.list_symbols().await.unwrap_err();
        assert!(matches!(err, SourceError::Unsupported { operation: "list_symbols", .. }));
    }
}
