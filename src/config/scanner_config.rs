//! Scanner configuration parsing from environment variables.
//!
//! This module handles universe sizing, keyword exclusion, batching
//! and the near-high / near-ATH thresholds.

use super::{EnvLookup, ensure_at_least, ensure_unit_fraction, ensure_within};
use crate::domain::errors::ConfigError;
use rust_decimal::Decimal;
use std::time::Duration;

/// Largest daily window a single kline request can return.
const MAX_LOOKBACK_DAYS: u64 = 1000;

/// Base assets never worth scanning: stablecoins, wrapped tokens, exchange
/// tokens, commodity-backed tokens and a few symbols with unreliable data.
pub const DEFAULT_EXCLUDE_KEYWORDS: &[&str] = &[
    // Stablecoins & derivatives
    "USDC", "USDE", "FDUSD", "USD1", "TUSD", "USDD", "USDP", "DAI", "BUSD", "GUSD", "USTC",
    "BFUSD", "XUSD", "EUR", "PYUSD", "SUSD", "SUSDE", "USDT0", "RLUSD", "SUSDS", "USDF", "USYC",
    "USDG",
    // Wrapped tokens
    "WETH", "WBTC", "STETH", "WSTETH", "RETH", "RSETH", "WEETH", "FBTC", "CBBTC", "JITOSOL",
    "JLP",
    // Exchange tokens
    "WBNB", "LEO", "GT", "USDT", "CRO", "CC", "BGB", "OKB", "HTX", "KCS",
    // Commodity-backed
    "XAUT",
    // Problematic listings
    "BSC-USD", "FIGR_HELOC", "SYRUPUSDC", "NIGHT", "HASH", "HYPE", "KAS", "M", "MNT", "RAIN",
    "BUIDL", "PI",
];

/// Fallback stock universe when the ranked screener is unavailable.
pub const DEFAULT_STOCK_SYMBOLS: &[&str] = &[
    "AAPL", "MSFT", "NVDA", "AMZN", "GOOGL", "META", "TSLA", "AVGO", "JPM", "V", "LLY", "WMT",
    "XOM", "MA", "UNH", "COST", "HD", "PG", "NFLX", "JNJ",
];

#[derive(Debug, Clone)]
pub struct ScannerEnvConfig {
    pub exclude_keywords: Vec<String>,
    pub universe_size: usize,
    pub quote_asset: String,
    pub batch_size: usize,
    pub batch_delay: Duration,
    pub lookback_days: u32,
    pub near_high_threshold: Decimal,
    /// A coin within this fraction of its ATH is classified `is_ath`.
    pub near_ath_tolerance: Decimal,
    pub stock_symbols: Vec<String>,
}

impl Default for ScannerEnvConfig {
    fn default() -> Self {
        Self {
            exclude_keywords: DEFAULT_EXCLUDE_KEYWORDS.iter().map(|s| s.to_string()).collect(),
            universe_size: 50,
            quote_asset: "USDT".to_string(),
            batch_size: 10,
            batch_delay: Duration::from_millis(200),
            lookback_days: 365,
            near_high_threshold: Decimal::new(10, 2),
            near_ath_tolerance: Decimal::new(5, 2),
            stock_symbols: DEFAULT_STOCK_SYMBOLS.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl ScannerEnvConfig {
    pub(crate) fn load(env: &EnvLookup<'_>) -> Result<Self, ConfigError> {
        let universe_size = env.parse_or::<usize>("SCAN_UNIVERSE_SIZE", 50)?;
        ensure_at_least("SCAN_UNIVERSE_SIZE", universe_size as u64, 1)?;

        let batch_size = env.parse_or::<usize>("SCAN_BATCH_SIZE", 10)?;
        ensure_at_least("SCAN_BATCH_SIZE", batch_size as u64, 1)?;

        let lookback_days = env.parse_or::<u32>("SCAN_LOOKBACK_DAYS", 365)?;
        ensure_within("SCAN_LOOKBACK_DAYS", u64::from(lookback_days), 2, MAX_LOOKBACK_DAYS)?;

        let near_high_threshold = ensure_unit_fraction(
            "NEAR_HIGH_THRESHOLD",
            env.parse_or::<Decimal>("NEAR_HIGH_THRESHOLD", Decimal::new(10, 2))?,
        )?;
        let near_ath_tolerance = ensure_unit_fraction(
            "NEAR_ATH_TOLERANCE",
            env.parse_or::<Decimal>("NEAR_ATH_TOLERANCE", Decimal::new(5, 2))?,
        )?;

        Ok(Self {
            exclude_keywords: env.list_or("SCAN_EXCLUDE_KEYWORDS", DEFAULT_EXCLUDE_KEYWORDS),
            universe_size,
            quote_asset: env.string_or("SCAN_QUOTE_ASSET", "USDT").to_uppercase(),
            batch_size,
            batch_delay: Duration::from_millis(env.parse_or::<u64>("SCAN_BATCH_DELAY_MS", 200)?),
            lookback_days,
            near_high_threshold,
            near_ath_tolerance,
            stock_symbols: env.list_or("STOCK_SYMBOLS", DEFAULT_STOCK_SYMBOLS),
        })
    }
}
