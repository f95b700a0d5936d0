//! Market-data source configuration parsing from environment variables.
//!
//! This module handles endpoints and credentials for every supported source:
//! - Binance, MEXC, CoinGecko (Crypto)
//! - Alpaca, Yahoo (Stock)
//!
//! plus the per-endpoint timeouts and the retry policy shared by all adapters.

use super::{EnvLookup, ensure_at_least};
use crate::domain::errors::ConfigError;
use std::time::Duration;

/// Retry/backoff policy applied by every source adapter's HTTP client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub min_backoff: Duration,
    pub max_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 2,
            min_backoff: Duration::from_millis(300),
            max_backoff: Duration::from_secs(3),
        }
    }
}

impl RetryPolicy {
    pub fn no_retry() -> Self {
        Self {
            max_retries: 0,
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone)]
pub struct SourceEnvConfig {
    pub binance_base_url: String,
    pub mexc_base_url: String,
    pub coingecko_base_url: String,
    pub alpaca_data_url: String,
    pub alpaca_api_key: String,
    pub alpaca_secret_key: String,
    pub yahoo_base_url: String,

    pub bar_timeout: Duration,
    pub listing_timeout: Duration,
    pub price_timeout: Duration,

    pub retry: RetryPolicy,
}

impl Default for SourceEnvConfig {
    fn default() -> Self {
        Self {
            binance_base_url: "https://api.binance.com".to_string(),
            mexc_base_url: "https://api.mexc.com".to_string(),
            coingecko_base_url: "https://api.coingecko.com".to_string(),
            alpaca_data_url: "https://data.alpaca.markets".to_string(),
            alpaca_api_key: String::new(),
            alpaca_secret_key: String::new(),
            yahoo_base_url: "https://query1.finance.yahoo.com".to_string(),
            bar_timeout: Duration::from_secs(10),
            listing_timeout: Duration::from_secs(15),
            price_timeout: Duration::from_secs(5),
            retry: RetryPolicy::default(),
        }
    }
}

impl SourceEnvConfig {
    pub(crate) fn load(env: &EnvLookup<'_>) -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let min_backoff_ms = env.parse_or::<u64>("HTTP_RETRY_MIN_MS", 300)?;
        let max_backoff_ms = env.parse_or::<u64>("HTTP_RETRY_MAX_MS", 3000)?;
        if max_backoff_ms < min_backoff_ms {
            return Err(ConfigError::Invalid {
                key: "HTTP_RETRY_MAX_MS",
                value: max_backoff_ms.to_string(),
                reason: format!("must not be below HTTP_RETRY_MIN_MS ({})", min_backoff_ms),
            });
        }

        Ok(Self {
            binance_base_url: env.string_or("BINANCE_BASE_URL", &defaults.binance_base_url),
            mexc_base_url: env.string_or("MEXC_BASE_URL", &defaults.mexc_base_url),
            coingecko_base_url: env.string_or("COINGECKO_BASE_URL", &defaults.coingecko_base_url),
            alpaca_data_url: env.string_or("ALPACA_DATA_URL", &defaults.alpaca_data_url),
            alpaca_api_key: env.string_or("ALPACA_API_KEY", ""),
            alpaca_secret_key: env.string_or("ALPACA_SECRET_KEY", ""),
            yahoo_base_url: env.string_or("YAHOO_BASE_URL", &defaults.yahoo_base_url),
            bar_timeout: timeout_secs(env, "BAR_TIMEOUT_SECS", 10)?,
            listing_timeout: timeout_secs(env, "LISTING_TIMEOUT_SECS", 15)?,
            price_timeout: timeout_secs(env, "PRICE_TIMEOUT_SECS", 5)?,
            retry: RetryPolicy {
                max_retries: env.parse_or::<u32>("HTTP_MAX_RETRIES", 2)?,
                min_backoff: Duration::from_millis(min_backoff_ms),
                max_backoff: Duration::from_millis(max_backoff_ms),
            },
        })
    }
}

fn timeout_secs(env: &EnvLookup<'_>, key: &'static str, default: u64) -> Result<Duration, ConfigError> {
    let secs = env.parse_or::<u64>(key, default)?;
    ensure_at_least(key, secs, 1)?;
    Ok(Duration::from_secs(secs))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_config_defaults() {
        let config = SourceEnvConfig::default();
        assert!(config.binance_base_url.contains("binance.com"));
        assert!(config.mexc_base_url.contains("mexc.com"));
        assert!(config.coingecko_base_url.contains("coingecko.com"));
        assert_eq!(config.price_timeout, Duration::from_secs(5));
        assert_eq!(config.retry.max_retries, 2);
    }

    #[test]
    fn test_backoff_bounds_validated() {
        let lookup = |key: &str| match key {
            "HTTP_RETRY_MIN_MS" => Some("500".to_string()),
            "HTTP_RETRY_MAX_MS" => Some("100".to_string()),
            _ => None,
        };
        let env = EnvLookup::new(&lookup);
        assert!(matches!(
            SourceEnvConfig::load(&env),
            Err(ConfigError::Invalid { key: "HTTP_RETRY_MAX_MS", .. })
        ));
    }
}
