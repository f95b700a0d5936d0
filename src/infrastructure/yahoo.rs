//! Yahoo Finance chart endpoint, used as the secondary stock bar source.

use crate::config::{RetryPolicy, SourceEnvConfig};
use crate::domain::errors::SourceError;
use crate::domain::market::{Bar, BarSeries, BarWindow, Symbol};
use crate::domain::ports::BarSource;
use crate::infrastructure::core::{HttpClientFactory, build_url, get_json};
use async_trait::async_trait;
use reqwest_middleware::ClientWithMiddleware;
use rust_decimal::Decimal;
use rust_decimal::prelude::FromPrimitive;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

const SOURCE_NAME: &str = "Yahoo";

#[derive(Debug, Deserialize)]
struct ChartResponse {
    chart: ChartData,
}

#[derive(Debug, Deserialize)]
struct ChartData {
    #[serde(default)]
    result: Option<Vec<ChartResult>>,
    #[serde(default)]
    error: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    #[serde(default)]
    timestamp: Option<Vec<i64>>,
    indicators: ChartIndicators,
}

#[derive(Debug, Deserialize)]
struct ChartIndicators {
    quote: Vec<ChartQuote>,
}

#[derive(Debug, Deserialize)]
struct ChartQuote {
    #[serde(default)]
    open: Vec<Option<f64>>,
    #[serde(default)]
    high: Vec<Option<f64>>,
    #[serde(default)]
    low: Vec<Option<f64>>,
    #[serde(default)]
    close: Vec<Option<f64>>,
    #[serde(default)]
    volume: Vec<Option<f64>>,
}

pub struct YahooChartClient {
    client: ClientWithMiddleware,
    base_url: String,
    timeout: Duration,
}

impl YahooChartClient {
    pub fn new(base_url: String, timeout: Duration, retry: &RetryPolicy) -> Self {
        Self {
            client: HttpClientFactory::create_client(retry, timeout),
            base_url,
            timeout,
        }
    }

    pub fn from_config(sources: &SourceEnvConfig) -> Self {
        Self::new(sources.yahoo_base_url.clone(), sources.bar_timeout, &sources.retry)
    }
}

/// Flattens the column-oriented chart payload into bars.
///
/// Days where Yahoo reports `null` for any OHLC value (halts, holidays) are
/// skipped; a payload with mismatched column lengths is rejected.
fn chart_to_series(symbol: &Symbol, response: ChartResponse) -> Result<BarSeries, SourceError> {
    if let Some(error) = response.chart.error.filter(|e| !e.is_null()) {
        return Err(SourceError::data_shape(SOURCE_NAME, format!("chart error: {}", error)));
    }

    let result = response
        .chart
        .result
        .and_then(|results| results.into_iter().next())
        .ok_or_else(|| SourceError::empty(SOURCE_NAME, format!("chart for {}", symbol)))?;

    let timestamps = result.timestamp.unwrap_or_default();
    let quote = result
        .indicators
        .quote
        .into_iter()
        .next()
        .ok_or_else(|| SourceError::data_shape(SOURCE_NAME, "chart has no quote indicators"))?;

    let n = timestamps.len();
    if [quote.open.len(), quote.high.len(), quote.low.len(), quote.close.len()]
        .iter()
        .any(|len| *len != n)
    {
        return Err(SourceError::data_shape(
            SOURCE_NAME,
            format!("chart columns for {} do not match {} timestamps", symbol, n),
        ));
    }

    let dec = |value: Option<f64>| value.and_then(Decimal::from_f64);
    let mut bars = Vec::with_capacity(n);
    for (i, ts) in timestamps.iter().enumerate() {
        let (Some(open), Some(high), Some(low), Some(close)) =
            (dec(quote.open[i]), dec(quote.high[i]), dec(quote.low[i]), dec(quote.close[i]))
        else {
            continue;
        };
        let volume = quote.volume.get(i).copied().flatten().and_then(Decimal::from_f64);
        bars.push(Bar {
            timestamp: ts * 1000,
            open,
            high,
            low,
            close,
            volume: volume.unwrap_or(Decimal::ZERO),
        });
    }

    if bars.is_empty() {
        return Err(SourceError::empty(SOURCE_NAME, format!("bars for {}", symbol)));
    }
    Ok(BarSeries::new(symbol.clone(), bars))
}

#[async_trait]
impl BarSource for YahooChartClient {
    fn name(&self) -> &str {
        SOURCE_NAME
    }

    async fn get_bars(&self, symbol: &Symbol, window: &BarWindow) -> Result<BarSeries, SourceError> {
        let period1 = window.start().timestamp().to_string();
        let period2 = window.end.timestamp().to_string();
        let path = format!("/v8/finance/chart/{}", symbol);
        let url = build_url(
            SOURCE_NAME,
            &self.base_url,
            &path,
            &[
                ("period1", period1.as_str()),
                ("period2", period2.as_str()),
                ("interval", "1d"),
            ],
        )?;

        let response: ChartResponse = get_json(&self.client, SOURCE_NAME, url, &[], self.timeout).await?;
        let series = chart_to_series(symbol, response)?;

        debug!("YahooChartClient: Fetched {} bars for {}", series.len(), symbol);
        Ok(series)
    }
}
